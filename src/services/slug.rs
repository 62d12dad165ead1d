//! URL slugs for case studies and service pages.

/// Folds accented Latin letters to ASCII. Covers Polish plus the
/// Central/Western European letters that show up in client names.
fn fold_diacritic(character: char) -> Option<&'static str> {
    let folded = match character {
        'ą' | 'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => "a",
        'ć' | 'č' | 'ç' => "c",
        'ď' => "d",
        'ę' | 'é' | 'è' | 'ê' | 'ë' | 'ě' => "e",
        'í' | 'ì' | 'î' | 'ï' => "i",
        'ł' | 'ľ' | 'ĺ' => "l",
        'ń' | 'ň' | 'ñ' => "n",
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' => "o",
        'ř' => "r",
        'ś' | 'š' => "s",
        'ß' => "ss",
        'ť' => "t",
        'ú' | 'ù' | 'û' | 'ü' | 'ů' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}

/// Converts a title to a URL-safe kebab-case slug.
///
/// Example: "Sklep dla Łódzkiej Piekarni" → "sklep-dla-lodzkiej-piekarni"
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut folded = String::with_capacity(title.len());
    for character in title.to_lowercase().chars() {
        if let Some(ascii) = fold_diacritic(character) {
            folded.push_str(ascii);
        } else if character.is_ascii_alphanumeric() {
            folded.push(character);
        } else {
            folded.push('-');
        }
    }

    folded
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
