//! Title-to-filename slugs: lowercase, ASCII-transliterated, hyphenated.

/// Transliteration for the Cyrillic range the corpus actually contains.
fn transliterate(c: char) -> &'static str {
    match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' | 'э' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' | 'й' | 'і' => "i",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ы' => "y",
        'ю' => "yu",
        'я' => "ya",
        _ => "",
    }
}

/// Derive a filesystem-safe slug from a recipe title.
///
/// ASCII letters and digits pass through lowercased, Cyrillic is
/// transliterated, every other run of characters collapses into a single
/// hyphen. Returns an empty string when nothing survives; the caller
/// decides the placeholder.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.to_lowercase().chars() {
        let mapped: String = if c.is_ascii_alphanumeric() {
            c.to_string()
        } else if ('а'..='я').contains(&c) || c == 'ё' || c == 'і' {
            transliterate(c).to_string()
        } else {
            String::new()
        };

        if mapped.is_empty() && !matches!(c, 'ъ' | 'ь') {
            // Separator or unmappable character
            pending_hyphen = !out.is_empty();
            continue;
        }
        if pending_hyphen {
            out.push('-');
            pending_hyphen = false;
        }
        out.push_str(&mapped);
    }

    out
}
