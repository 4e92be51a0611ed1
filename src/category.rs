use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::Regex;

const PATRISTIC_AUTHORS: &[&str] = &[
    "augustine", "athanasius", "cassian", "chrysostom", "origen", "jerome", "ambrose", "basil",
    "gregory", "cyprian", "tertullian", "irenaeus", "clement", "eusebius", "lactantius",
    "hilary", "leo", "cyril", "ephrem", "ignatius", "polycarp", "papias", "dionysius",
];

const MEDIEVAL_AUTHORS: &[&str] = &[
    "eckhart", "bonaventure", "bernard", "anselm", "matelda", "aquinas", "guyon", "tauler",
    "rolle", "hilton", "kempe", "kempis", "fenelon", "law",
];

const REFORMATION_AUTHORS: &[&str] = &[
    "calvin", "luther", "melanchthon", "zwingli", "knox", "tyndale", "cranmer", "beza", "bucer",
    "bullinger", "erasmus",
];

const PURITAN_AUTHORS: &[&str] = &[
    "owen", "baxter", "bunyan", "flavel", "goodwin", "watson", "boston", "manton", "howe",
    "gurnall", "charnock", "sibbes", "allestree", "mason", "rutherford", "mead", "vincent",
    "swinnock", "love", "edwards", "shepard", "fisher", "arndt",
];

const SERMON_AUTHORS: &[&str] = &["spurgeon", "maclaren", "moody", "whyte", "dods"];

const SYSTEMATIC_AUTHORS: &[&str] = &[
    "berkhof", "bavinck", "hodge", "warfield", "turretin", "dabney", "kuyper", "forsyth",
];

const APOLOGETICS_AUTHORS: &[&str] = &[
    "chesterton", "macdonald", "kierkegaard", "plantinga", "lewis", "pascal", "newman", "sayers",
    "coleridge",
];

const DEVOTIONAL_AUTHORS: &[&str] = &[
    "murray", "pink", "torrey", "smith", "gordon", "havergal", "underhill", "fenelon", "wesley",
    "newton", "moule", "orr", "quadrupani", "steele", "upham", "pasko", "inge", "oman",
];

const SCRIPTURE_TITLES: &[&str] = &[
    "catechism", "confession of faith", "heidelberg", "westminster", "book of jasher",
    "book of common prayer", "augsburg confession", "apology of the augsburg",
    "scottish confession", "scots confession",
];

const PATRISTIC_SEES: &[&str] = &["alexandria", "hippo", "antioch", "carthage", "caesarea"];

const CHURCH_HISTORY_TITLES: &[&str] = &[
    "eirenicon", "primitive christianity", "rise and progress", "american religious movement",
];

const REFORMATION_TITLES: &[&str] = &[
    "institutes", "bondage of the will", "small catechism", "large catechism", "smalcald",
    "formula of concord", "thirty-nine articles", "confutatio", "pulpit of the reformation",
];

const DEVOTIONAL_TITLES: &[&str] = &[
    "devotion", "prayer", "meditation", "spiritual", "way of peace", "way of holiness",
    "holy living", "mortification", "imitation", "uniformity", "piety", "the soul of",
    "waiting on", "with christ", "comfort for", "christian's secret", "kept for",
    "love enthroned", "plain account of christian", "hymn", "hymns", "psalms and hymns",
    "spiritual songs", "sacred songs", "night thoughts", "religious poems", "poetical works",
    "divine songs", "sacred hymns", "light and peace", "holy life", "in his steps",
    "to my younger", "comfort against", "sufferings of christ", "maxims of the saints",
    "meditating on scripture", "reflections on the christian", "quiet talks",
];

const REFERENCE_TITLES: &[&str] = &[
    "helps to the study", "revision revised", "word pictures", "genesis to revelation",
    "notes on the bible", "bible gallery",
];

/// Broad grouping of a manuscript used to break chapter counts down by
/// tradition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Scripture,
    BiblicalCommentary,
    Patristics,
    Medieval,
    Reformation,
    Puritan,
    SystematicTheology,
    ChurchHistory,
    Sermons,
    Apologetics,
    Devotional,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scripture => "Scripture",
            Self::BiblicalCommentary => "Biblical Commentary",
            Self::Patristics => "Patristics",
            Self::Medieval => "Medieval",
            Self::Reformation => "Reformation",
            Self::Puritan => "Puritan",
            Self::SystematicTheology => "Systematic Theology",
            Self::ChurchHistory => "Church History",
            Self::Sermons => "Sermons",
            Self::Apologetics => "Apologetics",
            Self::Devotional => "Devotional",
            Self::Other => "Other",
        }
    }
}

/// What the categoriser looks at. Text fields are matched case-insensitively;
/// subjects are the `;`-separated entries of the library header.
#[derive(Debug)]
pub struct CategoryInput<'a> {
    pub filename: &'a str,
    pub author: &'a str,
    pub title: &'a str,
    pub year: Option<i32>,
    pub subjects: &'a BTreeSet<String>,
}

#[derive(Debug)]
pub struct Categorizer {
    exposition: Regex,
    saint_of_see: Regex,
    biography: Regex,
}

impl Categorizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            exposition: Regex::new(r"^(?:an? )?exposition of\b")
                .context("failed to compile exposition title regex")?,
            saint_of_see: Regex::new(r"\bst\.?\s+\w+ of \w+")
                .context("failed to compile saint title regex")?,
            biography: Regex::new(r"^(?:life of|lives of)\b")
                .context("failed to compile biography title regex")?,
        })
    }

    /// First matching rule wins. Rules run from the most specific signal
    /// (collection filenames, commentary titles) to the broadest.
    pub fn categorize(&self, input: &CategoryInput<'_>) -> Category {
        let filename = input.filename.to_lowercase();
        let author = input.author.to_lowercase();
        let title = input.title.to_lowercase();
        let subject = |name: &str| input.subjects.contains(name);
        let by = |authors: &[&str]| authors.iter().any(|name| author.contains(name));
        let titled = |keywords: &[&str]| keywords.iter().any(|keyword| title.contains(keyword));
        let year = input.year.filter(|year| *year > 0);

        if filename.contains("anf") || filename.contains("npnf") {
            return Category::Patristics;
        }

        if filename.contains("expositor")
            || title.contains("expositor")
            || filename.contains("commentary")
            || title.contains("commentary")
            || self.exposition.is_match(&title)
            || titled(&["word pictures", "bible studies", "synthetic bible"])
        {
            return Category::BiblicalCommentary;
        }

        if subject("bibles") || subject("bible") || titled(SCRIPTURE_TITLES) {
            return Category::Scripture;
        }

        if subject("early")
            || subject("early church")
            || year.is_some_and(|year| year < 600)
            || by(PATRISTIC_AUTHORS)
            || titled(&["apostolic fathers", "early christian", "early church"])
            || (self.saint_of_see.is_match(&title) && titled(PATRISTIC_SEES))
        {
            return Category::Patristics;
        }

        if subject("mysticism")
            || year.is_some_and(|year| (600..1500).contains(&year))
            || by(MEDIEVAL_AUTHORS)
            || filename.contains("cloud")
        {
            return Category::Medieval;
        }

        if by(SYSTEMATIC_AUTHORS)
            || titled(&["systematic theology", "dogmatics", "dogmatic theology"])
        {
            return Category::SystematicTheology;
        }

        if subject("history")
            || titled(&["history", "historical", "huguenot"])
            || filename.contains("history")
            || filename.contains("huguenot")
            || author.contains("menno simon")
            || self.biography.is_match(&title)
            || titled(CHURCH_HISTORY_TITLES)
        {
            return Category::ChurchHistory;
        }

        if by(REFORMATION_AUTHORS) || titled(REFORMATION_TITLES) {
            return Category::Reformation;
        }

        if by(PURITAN_AUTHORS) {
            return Category::Puritan;
        }

        if by(SERMON_AUTHORS) || title.contains("sermon") || filename.contains("sermon") {
            return Category::Sermons;
        }

        if by(APOLOGETICS_AUTHORS) || titled(&["apologetics", "defence of", "defense of"]) {
            return Category::Apologetics;
        }

        if by(DEVOTIONAL_AUTHORS)
            || subject("christian life")
            || titled(DEVOTIONAL_TITLES)
            || filename.contains("hymn")
        {
            return Category::Devotional;
        }

        if titled(REFERENCE_TITLES) {
            return Category::BiblicalCommentary;
        }
        if title.contains("eckhart") {
            return Category::Medieval;
        }
        if titled(&["thomas boston", "psalmody", "william carey"]) {
            return Category::ChurchHistory;
        }
        if author.contains("philo") {
            return Category::Patristics;
        }

        Category::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categorize(filename: &str, author: &str, title: &str, year: Option<i32>, subjects: &[&str]) -> Category {
        let subjects: BTreeSet<String> = subjects.iter().map(|s| s.to_string()).collect();
        Categorizer::new().expect("categorizer").categorize(&CategoryInput {
            filename,
            author,
            title,
            year,
            subjects: &subjects,
        })
    }

    #[test]
    fn collections_and_commentaries_come_first() {
        assert_eq!(categorize("npnf1-01.txt", "Augustine", "Confessions", None, &[]), Category::Patristics);
        assert_eq!(
            categorize("expositors_romans.txt", "Handley Moule", "The Epistle to the Romans", None, &["bibles"]),
            Category::BiblicalCommentary
        );
        assert_eq!(
            categorize("x.txt", "Unknown", "An Exposition of the Psalms", None, &[]),
            Category::BiblicalCommentary
        );
    }

    #[test]
    fn header_subjects_decide_before_authors() {
        assert_eq!(categorize("kjv.txt", "Anonymous", "King James Bible", None, &["bibles"]), Category::Scripture);
        assert_eq!(categorize("x.txt", "John Owen", "Works", None, &["history"]), Category::ChurchHistory);
        assert_eq!(
            categorize("x.txt", "Unknown", "Sayings", None, &["all", "christian life"]),
            Category::Devotional
        );
    }

    #[test]
    fn year_and_author_lists_fill_in() {
        assert_eq!(categorize("x.txt", "Unknown", "Letters", Some(350), &[]), Category::Patristics);
        assert_eq!(categorize("x.txt", "Unknown", "Letters", Some(1200), &[]), Category::Medieval);
        assert_eq!(categorize("x.txt", "John Calvin", "Letters", Some(1550), &[]), Category::Reformation);
        assert_eq!(
            categorize("owen_mortification.txt", "John Owen", "Of the Mortification of Sin", Some(1656), &[]),
            Category::Puritan
        );
        assert_eq!(categorize("x.txt", "C. H. Spurgeon", "Morning", None, &[]), Category::Sermons);
        assert_eq!(categorize("x.txt", "Charles Hodge", "Theology", None, &[]), Category::SystematicTheology);
    }

    #[test]
    fn title_keywords_and_fallback() {
        assert_eq!(
            categorize("x.txt", "Unknown", "St. Dionysius of Alexandria", None, &[]),
            Category::Patristics
        );
        assert_eq!(categorize("x.txt", "Unknown", "Life of David Brainerd", None, &[]), Category::ChurchHistory);
        assert_eq!(categorize("x.txt", "Unknown", "Holy Living", None, &[]), Category::Devotional);
        assert_eq!(categorize("x.txt", "Unknown", "A Treatise", None, &[]), Category::Other);
        assert_eq!(Category::BiblicalCommentary.as_str(), "Biblical Commentary");
    }
}
