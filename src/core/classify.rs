use std::sync::LazyLock;

use regex::Regex;

use super::task::{Category, Priority};

const WORK: &[&str] = &[
    "meeting",
    "project",
    "report",
    "deadline",
    "work",
    "email",
    "call",
    "presentation",
    "proposal",
];
const PERSONAL: &[&str] = &["personal", "hobby", "learn", "read", "family", "friend"];
const HEALTH: &[&str] = &[
    "exercise",
    "gym",
    "health",
    "doctor",
    "appointment",
    "sleep",
    "workout",
    "meditation",
    "yoga",
];
const FINANCE: &[&str] = &[
    "budget",
    "pay",
    "bill",
    "expense",
    "investment",
    "tax",
    "finance",
    "money",
    "loan",
];
const SHOPPING: &[&str] = &["buy", "shop", "grocery", "purchase", "order", "store", "mall"];

static URGENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)urgent|asap|critical|emergency|immediately|today").unwrap()
});

static IMPORTANT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)important|soon|this week|deadline").unwrap());

static TENTATIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)maybe|could|might|consider").unwrap());

fn keywords(category: Category) -> &'static [&'static str] {
    match category {
        Category::Work => WORK,
        Category::Personal => PERSONAL,
        Category::Health => HEALTH,
        Category::Finance => FINANCE,
        Category::Shopping => SHOPPING,
    }
}

/// Pick the first category (in `Category::ALL` order) with a keyword that
/// occurs anywhere in the text. Falls back to `Personal`.
pub fn categorize(text: &str) -> Category {
    let lower = text.to_lowercase();
    Category::ALL
        .into_iter()
        .find(|category| keywords(*category).iter().any(|kw| lower.contains(kw)))
        .unwrap_or(Category::Personal)
}

/// Urgency beats importance beats tentativeness.
pub fn prioritize(text: &str) -> Priority {
    if URGENT_RE.is_match(text) {
        Priority::P1
    } else if IMPORTANT_RE.is_match(text) {
        Priority::P2
    } else if TENTATIVE_RE.is_match(text) {
        Priority::P3
    } else {
        Priority::P4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finance_bill_is_urgent() {
        let text = "urgent: pay electricity bill today";
        assert_eq!(categorize(text), Category::Finance);
        assert_eq!(prioritize(text), Priority::P1);
    }

    #[test]
    fn tentative_reading_is_personal() {
        let text = "maybe read a book";
        assert_eq!(categorize(text), Category::Personal);
        assert_eq!(prioritize(text), Priority::P3);
    }

    #[test]
    fn no_keyword_defaults_to_personal() {
        for text in ["", "walk the dog", "zzz", "??!"] {
            assert_eq!(categorize(text), Category::Personal, "{text:?}");
        }
    }

    #[test]
    fn earlier_category_wins() {
        // "email" (Work) and "buy" (Shopping) both match.
        assert_eq!(categorize("email about what to buy"), Category::Work);
        // "gym" (Health) and "pay" (Finance).
        assert_eq!(categorize("pay gym membership"), Category::Health);
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        assert_eq!(categorize("GROCERY run"), Category::Shopping);
        // "workout" contains "work", and Work is tested before Health.
        assert_eq!(categorize("Morning workout"), Category::Work);
    }

    #[test]
    fn urgency_wins_over_importance() {
        assert_eq!(prioritize("urgent and important deadline"), Priority::P1);
        assert_eq!(prioritize("important, maybe"), Priority::P2);
        assert_eq!(prioritize("finish report this week"), Priority::P2);
    }

    #[test]
    fn priority_defaults_to_p4() {
        assert_eq!(prioritize("water plants"), Priority::P4);
        assert_eq!(prioritize("ASAP reply"), Priority::P1);
    }
}
