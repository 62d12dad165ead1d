use crate::agents::{AudioClip, GeminiClient};
use crate::app::chat::AdminAssistant;
use crate::app::chat::conversation::{Conversation, TurnRole};
use crate::app::repl;
use crate::app::{
    CampaignsCommand, ClientsCommand, Commands, ContextCommand, OffersCommand, TasksCommand,
    TicketsCommand,
};
use crate::config::Config;
use crate::models::{
    Client, ContextField, ContextOsRecord, KanbanTask, Offer, OfferItem, OfferStatus, Priority,
    TaskStatus, TicketStatus,
};
use crate::services::content::generate_content;
use crate::services::dashboard::ClientDashboard;
use crate::services::dates::{format_day, parse_day, today};
use crate::services::meeting::analyze_meeting;
use crate::services::seed::seed_defaults;
use crate::services::stats::AgencyStats;
use crate::storage::StorageManager;
use color_eyre::{Result, eyre::eyre};

pub async fn execute(command: Commands, config: &Config) -> Result<()> {
    let storage = StorageManager::open(&config.storage).await?;

    match command {
        Commands::Chat { resume } => {
            let conversation = match resume {
                Some(session_id) => {
                    let entries = storage.load_chat_session(&session_id).await?;
                    Conversation::from_log(session_id, &entries)
                }
                None => Conversation::new(),
            };
            let client = GeminiClient::new(&config.gemini)?;
            let mut assistant =
                AdminAssistant::resume(client, storage, config.assistant.clone(), conversation);
            repl::run_chat(&mut assistant).await
        }
        Commands::Ask { message, audio } => {
            let client = GeminiClient::new(&config.gemini)?;
            let mut assistant = AdminAssistant::new(client, storage, config.assistant.clone());
            let reply = match (message, audio) {
                (_, Some(path)) => assistant.handle_voice(&AudioClip::from_file(&path)?).await?,
                (Some(message), None) if !message.trim().is_empty() => {
                    assistant.handle_message(&message).await?
                }
                _ => return Err(eyre!("Nothing to send: pass a message or --audio <file>")),
            };
            println!("{}", reply.text);
            Ok(())
        }
        Commands::Stats => {
            println!("{}", AgencyStats::collect(&storage).await?.render());
            Ok(())
        }
        Commands::Seed => {
            let report = seed_defaults(&storage).await?;
            println!(
                "Dodano usług: {}, case studies: {}, pominięto istniejących: {}",
                report.services_added, report.case_studies_added, report.skipped
            );
            Ok(())
        }
        Commands::Context { action } => context(&storage, action).await,
        Commands::Meeting { file } => {
            let transcript = std::fs::read_to_string(&file)?;
            let client = GeminiClient::new(&config.gemini)?;
            let summary = analyze_meeting(&client, &storage, &transcript, today()).await?;
            println!("{summary}");
            Ok(())
        }
        Commands::Generate { kind, topic } => {
            let client = GeminiClient::new(&config.gemini)?;
            let generated = generate_content(&client, &storage, kind, &topic).await?;
            if !generated.title.is_empty() {
                println!("{}\n", generated.title);
            }
            println!("{}", generated.content);
            Ok(())
        }
        Commands::Clients { action } => clients(&storage, action).await,
        Commands::Offers { action } => offers(&storage, action).await,
        Commands::Campaigns { action } => campaigns(&storage, action).await,
        Commands::Tasks { action } => tasks(&storage, action).await,
        Commands::Tickets { action } => tickets(&storage, action).await,
        Commands::Dashboard { client_id } => {
            println!("{}", ClientDashboard::load(&storage, &client_id).await?.render());
            Ok(())
        }
        Commands::History { session_id } => history(&storage, &session_id).await,
    }
}

fn parse_field<T: std::str::FromStr<Err = String>>(value: &str) -> Result<T> {
    value.parse::<T>().map_err(|error| eyre!(error))
}

async fn context(storage: &StorageManager, action: ContextCommand) -> Result<()> {
    match action {
        ContextCommand::Show => {
            let record = storage.load_context_os().await?;
            print!("{}", render_context(&record));
            Ok(())
        }
        ContextCommand::Set { field, text } => {
            let field: ContextField = parse_field(&field)?;
            let mut record = storage.load_context_os().await?;
            record.set(field, text);
            storage.save_context_os(record).await?;
            println!("Zapisano {field}.");
            Ok(())
        }
    }
}

fn render_context(record: &ContextOsRecord) -> String {
    let fields = [
        (ContextField::ToneOfVoice, &record.tone_of_voice),
        (ContextField::Sops, &record.sops),
        (ContextField::BusinessGoals, &record.business_goals),
        (ContextField::MeetingNotes, &record.meeting_notes),
        (ContextField::CustomInstructions, &record.custom_instructions),
    ];
    let mut out = String::new();
    for (field, value) in fields {
        let value = if value.trim().is_empty() { "(puste)" } else { value.trim() };
        out.push_str(&format!("[{field}]\n{value}\n\n"));
    }
    if !record.updated_at.is_empty() {
        out.push_str(&format!("Ostatnia zmiana: {}\n", record.updated_at));
    }
    out
}

async fn clients(storage: &StorageManager, action: ClientsCommand) -> Result<()> {
    match action {
        ClientsCommand::List => {
            for client in storage.list_clients().await? {
                println!(
                    "[{}] {} ({}) {}",
                    client.id,
                    client.display_name(),
                    client.status,
                    client.email
                );
            }
        }
        ClientsCommand::Add {
            name,
            company,
            email,
            phone,
        } => {
            let id = storage
                .add_client(Client {
                    company,
                    email,
                    phone,
                    ..Client::new(name)
                })
                .await?;
            println!("Dodano klienta {id}");
        }
    }
    Ok(())
}

/// Parses `name:quantity:unit_price`; the name itself may contain colons
pub(crate) fn parse_offer_item(value: &str) -> Result<OfferItem> {
    let mut parts = value.rsplitn(3, ':');
    let (Some(unit_price), Some(quantity), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(eyre!("Offer item must look like name:quantity:unit_price, got '{}'", value));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(eyre!("Offer item '{}' has no name", value));
    }
    Ok(OfferItem {
        name: name.to_string(),
        quantity: quantity
            .trim()
            .parse()
            .map_err(|_| eyre!("Invalid quantity in offer item '{}'", value))?,
        unit_price: unit_price
            .trim()
            .replace(',', ".")
            .parse()
            .map_err(|_| eyre!("Invalid unit price in offer item '{}'", value))?,
    })
}

async fn offers(storage: &StorageManager, action: OffersCommand) -> Result<()> {
    match action {
        OffersCommand::List { client } => {
            let offers = match client {
                Some(client_id) => storage.offers_for_client(&client_id).await?,
                None => storage.list_offers().await?,
            };
            for offer in offers {
                println!(
                    "[{}] {} {:.2} PLN ({}) klient {}",
                    offer.id, offer.title, offer.total, offer.status, offer.client_id
                );
            }
        }
        OffersCommand::Add {
            client_id,
            title,
            items,
            description,
            valid_until,
        } => {
            if storage.get_client(&client_id).await?.is_none() {
                return Err(eyre!("No client '{}'", client_id));
            }
            let items = items
                .iter()
                .map(|item| parse_offer_item(item))
                .collect::<Result<Vec<_>>>()?;
            let valid_until = match valid_until {
                Some(value) => format_day(
                    parse_day(&value, today()).ok_or_else(|| eyre!("Invalid date '{}'", value))?,
                ),
                None => String::new(),
            };
            let offer = Offer {
                description,
                valid_until,
                ..Offer::new(client_id, title, items)
            };
            let total = offer.total;
            let id = storage.add_offer(offer).await?;
            println!("Dodano ofertę {id} na {total:.2} PLN");
        }
        OffersCommand::Status { id, status } => {
            let status: OfferStatus = parse_field(&status)?;
            let offer = storage.set_offer_status(&id, status).await?;
            println!("Oferta „{}” ma teraz status {}", offer.title, offer.status);
        }
    }
    Ok(())
}

async fn campaigns(storage: &StorageManager, action: CampaignsCommand) -> Result<()> {
    match action {
        CampaignsCommand::List => {
            for campaign in storage.list_campaigns().await? {
                println!(
                    "[{}] {} ({}) {} do {}, budżet {:.2} PLN, pozostało {:.2} PLN",
                    campaign.id,
                    campaign.name,
                    campaign.status,
                    campaign.start_date,
                    campaign.end_date,
                    campaign.budget,
                    campaign.remaining_budget()
                );
            }
        }
    }
    Ok(())
}

async fn tasks(storage: &StorageManager, action: TasksCommand) -> Result<()> {
    match action {
        TasksCommand::List => {
            let tasks = storage.list_tasks().await?;
            for column in TaskStatus::COLUMNS {
                println!("== {column} ==");
                for task in tasks.iter().filter(|task| task.status == column) {
                    let due = task.due_date.as_deref().unwrap_or("-");
                    println!("  [{}] {} ({}, termin {})", task.id, task.title, task.priority, due);
                }
            }
        }
        TasksCommand::Add { title, priority, due } => {
            let priority = match priority {
                Some(value) => parse_field::<Priority>(&value)?,
                None => Priority::default(),
            };
            let due_date = match due {
                Some(value) => Some(format_day(
                    parse_day(&value, today()).ok_or_else(|| eyre!("Invalid date '{}'", value))?,
                )),
                None => None,
            };
            let id = storage
                .add_task(KanbanTask {
                    priority,
                    due_date,
                    ..KanbanTask::new(title)
                })
                .await?;
            println!("Dodano zadanie {id}");
        }
        TasksCommand::Move { id, status } => {
            let next = match status {
                Some(value) => parse_field::<TaskStatus>(&value)?,
                None => {
                    storage
                        .get_task(&id)
                        .await?
                        .ok_or_else(|| eyre!("No task '{}' on the board", id))?
                        .status
                        .advance()
                }
            };
            let task = storage.move_task(&id, next).await?;
            println!("„{}” → {}", task.title, task.status);
        }
    }
    Ok(())
}

async fn tickets(storage: &StorageManager, action: TicketsCommand) -> Result<()> {
    match action {
        TicketsCommand::List => {
            for ticket in storage.list_tickets().await? {
                println!(
                    "[{}] {} ({}, {}) klient {}",
                    ticket.id, ticket.subject, ticket.status, ticket.priority, ticket.client_id
                );
            }
        }
        TicketsCommand::Reply { id, text, author } => {
            let ticket = storage.reply_to_ticket(&id, &author, &text, true).await?;
            println!("Odpowiedziano na „{}” ({})", ticket.subject, ticket.status);
        }
        TicketsCommand::Close { id } => {
            let ticket = storage.set_ticket_status(&id, TicketStatus::Closed).await?;
            println!("Zamknięto „{}”", ticket.subject);
        }
    }
    Ok(())
}

async fn history(storage: &StorageManager, session_id: &str) -> Result<()> {
    let entries = storage.load_chat_session(session_id).await?;
    if entries.is_empty() {
        return Err(eyre!("No chat log for session '{}'", session_id));
    }
    let conversation = Conversation::from_log(session_id, &entries);
    for turn in conversation.turns() {
        let speaker = match turn.role {
            TurnRole::User => "Ty",
            TurnRole::Bot if turn.is_action => "Asystent ⚡",
            TurnRole::Bot => "Asystent",
        };
        println!("[{}] {speaker}: {}", turn.timestamp, turn.text);
    }
    Ok(())
}
