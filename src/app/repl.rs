use crate::agents::{AudioClip, CompletionClient};
use crate::app::chat::{AdminAssistant, AssistantReply};
use color_eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::Path;

const HELP: &str = "Komendy: /voice <plik> (wiadomość głosowa), /reset (nowa sesja), \
/session (id sesji), /help, /exit";

#[derive(Debug, PartialEq)]
enum SlashCommand<'a> {
    Exit,
    Reset,
    Session,
    Help,
    Voice(&'a str),
    Unknown(&'a str),
}

fn parse_slash(input: &str) -> SlashCommand<'_> {
    let (name, argument) = input
        .split_once(char::is_whitespace)
        .map_or((input, ""), |(name, rest)| (name, rest.trim()));
    match name {
        "/exit" | "/quit" | "/q" => SlashCommand::Exit,
        "/reset" | "/new" => SlashCommand::Reset,
        "/session" => SlashCommand::Session,
        "/help" | "/?" => SlashCommand::Help,
        "/voice" | "/audio" => SlashCommand::Voice(argument),
        other => SlashCommand::Unknown(other),
    }
}

fn print_reply(reply: &AssistantReply) {
    if reply.is_action {
        println!("⚡ {}\n", reply.text);
    } else {
        println!("{}\n", reply.text);
    }
}

/// Interactive loop: every line goes to the assistant, `/` lines are local
/// commands. Model errors are printed and the session carries on.
pub async fn run_chat<C: CompletionClient>(assistant: &mut AdminAssistant<C>) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("ECM Digital: asystent AI (sesja {})", assistant.conversation().session_id());
    println!("{HELP}\n");

    loop {
        match editor.readline("ecm> ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(input);

                let result = if input.starts_with('/') {
                    match parse_slash(input) {
                        SlashCommand::Exit => break,
                        SlashCommand::Reset => {
                            assistant.reset();
                            println!("Nowa sesja {}\n", assistant.conversation().session_id());
                            continue;
                        }
                        SlashCommand::Session => {
                            println!("{}\n", assistant.conversation().session_id());
                            continue;
                        }
                        SlashCommand::Help => {
                            println!("{HELP}\n");
                            continue;
                        }
                        SlashCommand::Voice("") => {
                            eprintln!("Podaj plik: /voice <plik>\n");
                            continue;
                        }
                        SlashCommand::Voice(path) => match AudioClip::from_file(Path::new(path)) {
                            Ok(clip) => assistant.handle_voice(&clip).await,
                            Err(error) => Err(error),
                        },
                        SlashCommand::Unknown(name) => {
                            eprintln!("Nieznana komenda {name}. {HELP}\n");
                            continue;
                        }
                    }
                } else {
                    assistant.handle_message(input).await
                };

                match result {
                    Ok(reply) => print_reply(&reply),
                    Err(error) => {
                        tracing::debug!(?error, "assistant turn failed");
                        eprintln!("❌ Coś poszło nie tak: {error}\n");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Użyj /exit, aby zakończyć.");
            }
            Err(ReadlineError::Eof) => break,
            Err(error) => return Err(error.into()),
        }
    }
    Ok(())
}
