use super::{ClassifierAnalysis, ContentClassifier};
use crate::error::{ModerationError, Result};
use crate::models::{ContentSubmission, ModerationCategory};
use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use unicode_segmentation::UnicodeSegmentation;

const MODEL_ID: &str = "heuristic-text-v1";

/// Score contributed by each distinct matched term
const TERM_WEIGHT: f64 = 0.4;

const DEFAULT_SENSITIVE_WORDS: &str = include_str!("../../../data/sensitive_words.txt");

const SPAM_PHRASES: [&str; 12] = [
    "click here",
    "buy now",
    "limited time",
    "act now",
    "free money",
    "make money fast",
    "work from home",
    "weight loss",
    "viagra",
    "cialis",
    "casino",
    "lottery",
];

struct Lexicon {
    category: ModerationCategory,
    pattern: Regex,
}

/// Deterministic text classifier over title, description and tags.
///
/// Combines a sensitive word list (hate speech), per-category keyword
/// lexicons and spam heuristics.
pub struct HeuristicClassifier {
    sensitive_words: HashSet<String>,
    lexicons: Vec<Lexicon>,
    url_pattern: Regex,
    contact_patterns: Vec<Regex>,
    punctuation_pattern: Regex,
}

impl HeuristicClassifier {
    /// Create a classifier with the sensitive words in `words_file`
    pub fn new(words_file: impl AsRef<Path>) -> Result<Self> {
        let sensitive_words = Self::load_words(words_file)?;
        Ok(Self::with_words(sensitive_words))
    }

    /// Create a classifier with the bundled sensitive word list
    pub fn with_default_words() -> Self {
        Self::with_words(Self::parse_words(DEFAULT_SENSITIVE_WORDS))
    }

    fn with_words(sensitive_words: HashSet<String>) -> Self {
        Self {
            sensitive_words,
            lexicons: Self::compile_lexicons(),
            url_pattern: Regex::new(r"https?://[^\s]+").expect("URL regex pattern is valid"),
            contact_patterns: vec![
                // Phone numbers (various formats)
                Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("Phone regex pattern is valid"),
                // Email addresses
                Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
                    .expect("Email regex pattern is valid"),
            ],
            punctuation_pattern: Regex::new(r"[!?]{4,}")
                .expect("Punctuation regex pattern is valid"),
        }
    }

    fn load_words(path: impl AsRef<Path>) -> Result<HashSet<String>> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ModerationError::Config(format!(
                "Failed to load sensitive words from {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Ok(Self::parse_words(&content))
    }

    fn parse_words(content: &str) -> HashSet<String> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_lowercase)
            .collect()
    }

    fn compile_lexicons() -> Vec<Lexicon> {
        let table = [
            (
                ModerationCategory::Violence,
                r"(?i)\b(kill|killing|murder|gore|beheading|stabbing|massacre|torture)\b",
            ),
            (
                ModerationCategory::Drugs,
                r"(?i)\b(cocaine|heroin|meth|methamphetamine|fentanyl|mdma|ecstasy|lsd)\b",
            ),
            (
                ModerationCategory::SelfHarm,
                r"(?i)\b(suicide|self[- ]harm|cutting myself|kill myself|anorexia tips)\b",
            ),
            (
                ModerationCategory::Terrorism,
                r"(?i)\b(jihad|isis|bomb[- ]making|pipe bomb|terror attack|extremist)\b",
            ),
            (
                ModerationCategory::Underage,
                r"(?i)\b(underage|under[- ]?18|minor|minors|preteen|schoolgirl|schoolboy|jailbait)\b",
            ),
            (
                ModerationCategory::ExplicitContent,
                r"(?i)\b(nsfw|xxx|porn|nude|nudes|hardcore|uncensored)\b",
            ),
            (
                ModerationCategory::Harassment,
                r"(?i)\b(doxx|doxxed|doxxing|stalker|harass|harassment)\b",
            ),
            (
                ModerationCategory::Copyright,
                r"(?i)\b(pirated|leaked|torrent|full movie|camrip|warez)\b",
            ),
        ];

        table
            .into_iter()
            .map(|(category, pattern)| Lexicon {
                category,
                pattern: Regex::new(pattern).expect("Lexicon regex pattern is valid"),
            })
            .collect()
    }

    /// Text the classifier looks at
    fn text_of(submission: &ContentSubmission) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(title) = &submission.title {
            parts.push(title);
        }
        if let Some(description) = &submission.description {
            parts.push(description);
        }
        parts.extend(submission.tags.iter().map(String::as_str));
        parts.join("\n")
    }

    /// Classify raw text
    pub fn analyze_text(&self, text: &str) -> ClassifierAnalysis {
        let mut analysis = ClassifierAnalysis::new(MODEL_ID);
        let mut matched_terms: BTreeMap<ModerationCategory, BTreeSet<String>> = BTreeMap::new();

        // Check 1: Sensitive words
        let normalized = text.to_lowercase();
        let sensitive: BTreeSet<String> = normalized
            .unicode_words()
            .filter(|word| self.sensitive_words.contains(*word))
            .map(str::to_string)
            .collect();
        if !sensitive.is_empty() {
            tracing::debug!(terms = ?sensitive, "Sensitive words matched");
            matched_terms.insert(ModerationCategory::HateSpeech, sensitive);
        }

        // Check 2: Category lexicons
        for lexicon in &self.lexicons {
            let terms: BTreeSet<String> = lexicon
                .pattern
                .find_iter(text)
                .map(|m| m.as_str().to_lowercase())
                .collect();
            if !terms.is_empty() {
                tracing::debug!(
                    category = lexicon.category.as_str(),
                    terms = ?terms,
                    "Lexicon terms matched"
                );
                matched_terms
                    .entry(lexicon.category)
                    .or_default()
                    .extend(terms);
            }
        }

        for (category, terms) in &matched_terms {
            analysis.score(*category, terms.len() as f64 * TERM_WEIGHT);
            analysis
                .risk_factors
                .push(format!("{}_terms_detected", category.as_str()));
        }

        // Check 3: Spam heuristics
        let link_count = self.url_pattern.find_iter(text).count();
        let signals = self.spam_signals(text, link_count);
        if !signals.is_empty() {
            let spam_score: f64 = signals.iter().map(|(_, weight)| weight).sum();
            analysis.score(ModerationCategory::Spam, spam_score);
            analysis
                .risk_factors
                .extend(signals.iter().map(|(name, _)| name.to_string()));
        }

        analysis.text_analysis = json!({
            "toxicity": analysis
                .scores
                .get(&ModerationCategory::HateSpeech)
                .copied()
                .unwrap_or(0.0),
            "matched_terms": matched_terms,
            "link_count": link_count,
            "word_count": text.unicode_words().count(),
        });

        analysis
    }

    fn spam_signals(&self, text: &str, link_count: usize) -> Vec<(&'static str, f64)> {
        let mut signals = Vec::new();

        if link_count > 5 {
            signals.push(("excessive_links", 0.4));
        } else if link_count > 3 {
            signals.push(("multiple_links", 0.2));
        } else if link_count > 1 {
            signals.push(("some_links", 0.1));
        }

        // Short message with links (classic spam)
        if link_count > 0 && text.split_whitespace().count() < 10 {
            signals.push(("short_message_with_links", 0.2));
        }

        let lower = text.to_lowercase();
        if SPAM_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
            signals.push(("spam_phrases", 0.15));
        }

        if self.contact_patterns.iter().any(|p| p.is_match(text)) {
            signals.push(("contact_details", 0.2));
        }

        if self.punctuation_pattern.is_match(text) {
            signals.push(("excessive_punctuation", 0.2));
        }

        if has_excessive_caps(text) {
            signals.push(("excessive_capitalization", 0.1));
        }

        if has_repeated_chars(text) {
            signals.push(("repeated_characters", 0.1));
        }

        signals
    }
}

#[async_trait]
impl ContentClassifier for HeuristicClassifier {
    async fn classify(&self, submission: &ContentSubmission) -> Result<ClassifierAnalysis> {
        let text = Self::text_of(submission);
        let mut analysis = self.analyze_text(&text);

        if let Some(text_analysis) = analysis.text_analysis.as_object_mut() {
            text_analysis.insert("keywords".to_string(), json!(submission.tags));
        }

        tracing::debug!(
            submission_id = %submission.id,
            confidence = analysis.confidence,
            categories = analysis.scores.len(),
            "Heuristic classification finished"
        );

        Ok(analysis)
    }
}

/// More than 70% capitals over at least 10 letters
fn has_excessive_caps(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();

    if letters.len() < 10 {
        return false;
    }

    let caps_count = letters.iter().filter(|c| c.is_uppercase()).count();
    caps_count as f32 / letters.len() as f32 > 0.7
}

/// Five or more of the same character in a row (e.g. "hellooooo")
fn has_repeated_chars(text: &str) -> bool {
    let mut previous = None;
    let mut run = 0;

    for c in text.chars() {
        if Some(c) == previous {
            run += 1;
            if run >= 5 {
                return true;
            }
        } else {
            previous = Some(c);
            run = 1;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::submission::fixtures;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_words_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "badword").unwrap();
        writeln!(file, "offensive").unwrap();
        writeln!(file, "# Comment line").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "inappropriate").unwrap();
        file
    }

    #[test]
    fn test_load_words() {
        let file = create_test_words_file();
        let classifier = HeuristicClassifier::new(file.path()).unwrap();

        assert_eq!(classifier.sensitive_words.len(), 3);
        assert!(classifier.sensitive_words.contains("badword"));
        assert!(classifier.sensitive_words.contains("inappropriate"));
    }

    #[test]
    fn test_missing_words_file() {
        let result = HeuristicClassifier::new("/nonexistent/words.txt");
        assert!(matches!(result, Err(ModerationError::Config(_))));
    }

    #[test]
    fn test_default_words_are_bundled() {
        let classifier = HeuristicClassifier::with_default_words();
        assert!(classifier.sensitive_words.contains("subhuman"));
    }

    #[test]
    fn test_clean_text_has_base_confidence() {
        let classifier = HeuristicClassifier::with_default_words();
        let analysis = classifier.analyze_text("Sunset over the harbour");

        assert!(analysis.scores.is_empty());
        assert_eq!(analysis.confidence, 0.1);
        assert!(analysis.risk_factors.is_empty());
    }

    #[test]
    fn test_sensitive_words_score_hate_speech() {
        let file = create_test_words_file();
        let classifier = HeuristicClassifier::new(file.path()).unwrap();

        let analysis = classifier.analyze_text("This badword is offensive");
        let score = analysis.scores[&ModerationCategory::HateSpeech];
        assert!(score > 0.7, "two sensitive words should cross review threshold");
        assert_eq!(analysis.text_analysis["toxicity"], json!(score));
    }

    #[test]
    fn test_single_term_stays_below_review_threshold() {
        let classifier = HeuristicClassifier::with_default_words();
        let analysis = classifier.analyze_text("A murder mystery novel");

        assert!(analysis.scores[&ModerationCategory::Violence] < 0.7);
    }

    #[test]
    fn test_repeated_terms_count_once() {
        let classifier = HeuristicClassifier::with_default_words();
        let once = classifier.analyze_text("gore");
        let many = classifier.analyze_text("gore GORE gore");

        assert_eq!(
            once.scores[&ModerationCategory::Violence],
            many.scores[&ModerationCategory::Violence]
        );
    }

    #[test]
    fn test_multiple_lexicon_terms() {
        let classifier = HeuristicClassifier::with_default_words();
        let analysis = classifier.analyze_text("Uncut gore and torture footage");

        assert!(analysis.scores[&ModerationCategory::Violence] > 0.7);
        assert!(analysis
            .risk_factors
            .contains(&"violence_terms_detected".to_string()));
    }

    #[test]
    fn test_spam_links_and_phrases() {
        let classifier = HeuristicClassifier::with_default_words();
        let text = "Buy now https://a.com https://b.com https://c.com https://d.com";

        let analysis = classifier.analyze_text(text);
        assert!(analysis.scores[&ModerationCategory::Spam] > 0.5);
        assert!(analysis.risk_factors.contains(&"spam_phrases".to_string()));
        assert_eq!(analysis.text_analysis["link_count"], json!(4));
    }

    #[test]
    fn test_excessive_caps() {
        assert!(has_excessive_caps("HELLO THIS IS ALL CAPS"));
        assert!(!has_excessive_caps("SHORT"));
        assert!(!has_excessive_caps("Hello this is mostly lowercase"));
    }

    #[test]
    fn test_repeated_chars() {
        assert!(has_repeated_chars("Hellooooooo"));
        assert!(!has_repeated_chars("Hellooo"));
        assert!(!has_repeated_chars(""));
    }

    #[tokio::test]
    async fn test_classify_reads_title_description_and_tags() {
        let classifier = HeuristicClassifier::with_default_words();
        let mut submission = fixtures::submission("FanzTube");
        submission.title = Some("Leaked".to_string());
        submission.description = Some("Full movie".to_string());
        submission.tags = vec!["torrent".to_string()];

        let analysis = classifier.classify(&submission).await.unwrap();
        assert_eq!(analysis.model, MODEL_ID);
        assert_eq!(analysis.scores[&ModerationCategory::Copyright], 1.0);
        assert_eq!(analysis.text_analysis["keywords"], json!(["torrent"]));
    }
}
