use crate::error::CitationError;

/// One canonical book of the reference table.
///
/// `aliases` holds the lowercase, period-free spellings the resolver accepts in
/// addition to the lowercased `name`. Numbered books list both the spaced and
/// the run-together forms (`1 cor`, `1cor`) as well as the Roman-prefixed form
/// (`i cor`).
#[derive(Debug, PartialEq, Eq)]
pub struct BookDefinition {
    pub name: &'static str,
    pub slug: &'static str,
    pub ordinal: u32,
    pub chapter_count: u32,
    pub aliases: &'static [&'static str],
}

impl BookDefinition {
    pub fn contains_chapter(&self, chapter: u32) -> bool {
        (1..=self.chapter_count).contains(&chapter)
    }
}

macro_rules! book {
    ($name:literal, $slug:literal, $ordinal:literal, $chapters:literal, [$($alias:literal),* $(,)?]) => {
        BookDefinition {
            name: $name,
            slug: $slug,
            ordinal: $ordinal,
            chapter_count: $chapters,
            aliases: &[$($alias),*],
        }
    };
}

// Old Testament 1-39, deuterocanon 40-55, New Testament 56-82.
pub static BOOKS: &[BookDefinition] = &[
    book!("Genesis", "genesis", 1, 50, ["gen", "gn"]),
    book!("Exodus", "exodus", 2, 40, ["exod", "exo"]),
    book!("Leviticus", "leviticus", 3, 27, ["lev", "lv"]),
    book!("Numbers", "numbers", 4, 36, ["num", "numb"]),
    book!("Deuteronomy", "deuteronomy", 5, 34, ["deut", "deu", "dt"]),
    book!("Joshua", "joshua", 6, 24, ["josh", "jos"]),
    book!("Judges", "judges", 7, 21, ["judg", "jdg", "jdgs"]),
    book!("Ruth", "ruth", 8, 4, ["rth"]),
    book!("1 Samuel", "1-samuel", 9, 31, ["1 sam", "1sam", "1 sa", "1sa", "i sam", "i sa"]),
    book!("2 Samuel", "2-samuel", 10, 24, ["2 sam", "2sam", "2 sa", "2sa", "ii sam", "ii sa"]),
    book!("1 Kings", "1-kings", 11, 22, ["1 kgs", "1kgs", "1 ki", "1ki", "i kgs", "i ki", "i kings"]),
    book!("2 Kings", "2-kings", 12, 25, ["2 kgs", "2kgs", "2 ki", "2ki", "ii kgs", "ii ki", "ii kings"]),
    book!("1 Chronicles", "1-chronicles", 13, 29, ["1 chr", "1chr", "1 chron", "1chron", "i chr", "i chron"]),
    book!("2 Chronicles", "2-chronicles", 14, 36, ["2 chr", "2chr", "2 chron", "2chron", "ii chr", "ii chron"]),
    book!("Ezra", "ezra", 15, 10, ["ezr"]),
    book!("Nehemiah", "nehemiah", 16, 13, ["neh"]),
    book!("Esther", "esther", 17, 10, ["esth", "est"]),
    book!("Job", "job", 18, 42, []),
    book!("Psalms", "psalms", 19, 150, ["ps", "pss", "psa", "psal", "psalm"]),
    book!("Proverbs", "proverbs", 20, 31, ["prov", "pro", "prv"]),
    book!("Ecclesiastes", "ecclesiastes", 21, 12, ["eccl", "eccles", "ecc", "qoh", "qoheleth"]),
    book!("Song of Solomon", "song-of-solomon", 22, 8, ["song of sol", "song of songs", "canticles", "cant"]),
    book!("Isaiah", "isaiah", 23, 66, ["isa"]),
    book!("Jeremiah", "jeremiah", 24, 52, ["jer", "jr"]),
    book!("Lamentations", "lamentations", 25, 5, ["lam"]),
    book!("Ezekiel", "ezekiel", 26, 48, ["ezek", "ezk"]),
    book!("Daniel", "daniel", 27, 12, ["dan", "dn"]),
    book!("Hosea", "hosea", 28, 14, ["hos"]),
    book!("Joel", "joel", 29, 3, []),
    book!("Amos", "amos", 30, 9, ["amo"]),
    book!("Obadiah", "obadiah", 31, 1, ["obad", "oba"]),
    book!("Jonah", "jonah", 32, 4, ["jon", "jnh"]),
    book!("Micah", "micah", 33, 7, ["mic"]),
    book!("Nahum", "nahum", 34, 3, ["nah"]),
    book!("Habakkuk", "habakkuk", 35, 3, ["hab"]),
    book!("Zephaniah", "zephaniah", 36, 3, ["zeph", "zep"]),
    book!("Haggai", "haggai", 37, 2, ["hag"]),
    book!("Zechariah", "zechariah", 38, 14, ["zech", "zec"]),
    book!("Malachi", "malachi", 39, 4, ["mal"]),
    book!("Tobit", "tobit", 40, 14, ["tob"]),
    book!("Judith", "judith", 41, 16, ["jdt"]),
    book!("1 Maccabees", "1-maccabees", 42, 16, ["1 macc", "1macc", "1 mac", "1mac", "i macc", "i mac"]),
    book!("2 Maccabees", "2-maccabees", 43, 15, ["2 macc", "2macc", "2 mac", "2mac", "ii macc", "ii mac"]),
    book!("3 Maccabees", "3-maccabees", 44, 7, ["3 macc", "3macc", "3 mac", "3mac", "iii macc", "iii mac"]),
    book!("4 Maccabees", "4-maccabees", 45, 18, ["4 macc", "4macc", "4 mac", "4mac", "iv macc", "iv mac"]),
    book!("Wisdom of Solomon", "wisdom", 46, 19, ["wis", "wisd", "wisdom of sol", "wisdom"]),
    book!("Sirach", "sirach", 47, 51, ["sir", "ecclus", "ecclesiasticus"]),
    book!("Baruch", "baruch", 48, 6, ["bar"]),
    book!("Letter of Jeremiah", "letter-of-jeremiah", 49, 1, ["let jer", "ep jer", "epistle of jer"]),
    book!("Prayer of Azariah", "prayer-of-azariah", 50, 1, ["pr azar", "sg three", "song of three"]),
    book!("Susanna", "susanna", 51, 1, ["sus"]),
    book!("Bel and the Dragon", "bel", 52, 1, ["bel", "bel and dragon"]),
    book!("Prayer of Manasseh", "prayer-of-manasseh", 53, 1, ["pr man", "prayer of man"]),
    book!("1 Esdras", "1-esdras", 54, 9, ["1 esd", "1esd", "i esd", "3 ezra"]),
    book!("2 Esdras", "2-esdras", 55, 16, ["2 esd", "2esd", "ii esd", "4 ezra"]),
    book!("Matthew", "matthew", 56, 28, ["matt", "mat", "mt"]),
    book!("Mark", "mark", 57, 16, ["mar", "mrk", "mk"]),
    book!("Luke", "luke", 58, 24, ["luk", "lk"]),
    book!("John", "john", 59, 21, ["joh", "jhn", "jn"]),
    book!("Acts", "acts", 60, 28, ["act"]),
    book!("Romans", "romans", 61, 16, ["rom", "ro", "rm"]),
    book!("1 Corinthians", "1-corinthians", 62, 16, ["1 cor", "1cor", "i cor", "1 co", "1co"]),
    book!("2 Corinthians", "2-corinthians", 63, 13, ["2 cor", "2cor", "ii cor", "2 co", "2co"]),
    book!("Galatians", "galatians", 64, 6, ["gal", "ga"]),
    book!("Ephesians", "ephesians", 65, 6, ["eph", "ephes"]),
    book!("Philippians", "philippians", 66, 4, ["phil", "php"]),
    book!("Colossians", "colossians", 67, 4, ["col"]),
    book!("1 Thessalonians", "1-thessalonians", 68, 5, ["1 thess", "1thess", "1 thes", "1thes", "i thess", "i thes", "1 th"]),
    book!("2 Thessalonians", "2-thessalonians", 69, 3, ["2 thess", "2thess", "2 thes", "2thes", "ii thess", "ii thes", "2 th"]),
    book!("1 Timothy", "1-timothy", 70, 6, ["1 tim", "1tim", "i tim", "1 ti", "1ti"]),
    book!("2 Timothy", "2-timothy", 71, 4, ["2 tim", "2tim", "ii tim", "2 ti", "2ti"]),
    book!("Titus", "titus", 72, 3, ["tit"]),
    book!("Philemon", "philemon", 73, 1, ["phlm", "phm", "philem"]),
    book!("Hebrews", "hebrews", 74, 13, ["heb"]),
    book!("James", "james", 75, 5, ["jas", "jam", "jm"]),
    book!("1 Peter", "1-peter", 76, 5, ["1 pet", "1pet", "1 pe", "1pe", "i pet", "i pe", "1 pt", "1pt"]),
    book!("2 Peter", "2-peter", 77, 3, ["2 pet", "2pet", "2 pe", "2pe", "ii pet", "ii pe", "2 pt", "2pt"]),
    book!("1 John", "1-john", 78, 5, ["1john", "1 jn", "1jn", "i john", "i jn", "1 jo", "1jo"]),
    book!("2 John", "2-john", 79, 1, ["2john", "2 jn", "2jn", "ii john", "ii jn"]),
    book!("3 John", "3-john", 80, 1, ["3john", "3 jn", "3jn", "iii john", "iii jn"]),
    book!("Jude", "jude", 81, 1, ["jud"]),
    book!("Revelation", "revelation", 82, 22, ["rev", "the revelation", "apocalypse", "apoc"]),
];

/// Books in canonical order.
pub fn iter() -> impl Iterator<Item = &'static BookDefinition> {
    BOOKS.iter()
}

pub fn resolve(slug: &str) -> Result<&'static BookDefinition, CitationError> {
    BOOKS
        .iter()
        .find(|book| book.slug == slug)
        .ok_or_else(|| CitationError::UnknownBookSlug {
            slug: slug.to_string(),
        })
}

pub fn validate_chapter(book: &BookDefinition, chapter: u32) -> Result<(), CitationError> {
    if book.contains_chapter(chapter) {
        return Ok(());
    }

    Err(CitationError::ChapterOutOfRange {
        book: book.name,
        chapter,
        chapter_count: book.chapter_count,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ordinals_are_contiguous_and_slugs_unique() {
        let mut slugs = HashSet::new();
        for (index, book) in BOOKS.iter().enumerate() {
            assert_eq!(book.ordinal as usize, index + 1, "ordinal gap at {}", book.name);
            assert!(slugs.insert(book.slug), "duplicate slug {}", book.slug);
            assert!(book.chapter_count >= 1);
        }
        assert_eq!(BOOKS.len(), 82);
    }

    #[test]
    fn slugs_are_lowercase_url_safe() {
        for book in iter() {
            assert!(
                book.slug
                    .chars()
                    .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-'),
                "slug {} is not url safe",
                book.slug
            );
        }
    }

    #[test]
    fn resolve_finds_numbered_and_deuterocanonical_books() {
        assert_eq!(resolve("romans").expect("romans").chapter_count, 16);
        assert_eq!(resolve("1-corinthians").expect("1 cor").name, "1 Corinthians");
        assert_eq!(resolve("sirach").expect("sirach").ordinal, 47);
        assert_eq!(resolve("song-of-solomon").expect("song").chapter_count, 8);
        assert!(matches!(
            resolve("hezekiah"),
            Err(CitationError::UnknownBookSlug { .. })
        ));
    }

    #[test]
    fn validate_chapter_checks_bounds() {
        let psalms = resolve("psalms").expect("psalms");
        assert!(validate_chapter(psalms, 1).is_ok());
        assert!(validate_chapter(psalms, 150).is_ok());
        assert!(matches!(
            validate_chapter(psalms, 151),
            Err(CitationError::ChapterOutOfRange { chapter: 151, .. })
        ));
        assert!(validate_chapter(psalms, 0).is_err());
    }
}
