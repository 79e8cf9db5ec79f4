use contracts::Effort;
use regex::Regex;

/// Fallback classification used when the planner agent times out or returns a
/// plan this crate can't parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Simple,
    Standard,
    Complex,
}

impl Complexity {
    /// `Simple -> Medium, Standard -> High, Complex -> Max`, per the fixed
    /// effort table.
    pub fn effort(self) -> Effort {
        match self {
            Complexity::Simple => Effort::Medium,
            Complexity::Standard => Effort::High,
            Complexity::Complex => Effort::Max,
        }
    }
}

struct Rule {
    complexity: Complexity,
    /// Lower sorts first; simple patterns are checked before complex ones so
    /// a short greeting never falls through to a complex-sounding keyword
    /// that happens to also appear in it.
    priority: u8,
    pattern: Regex,
}

/// One rule per regex, evaluated in priority order, first match wins —
/// the same "sorted rules, first match, default otherwise" shape as a
/// priority-ordered router, just over a fixed two-tier pattern table instead
/// of user-configured rules.
fn rules() -> Vec<Rule> {
    vec![
        Rule {
            complexity: Complexity::Simple,
            priority: 0,
            pattern: Regex::new(r"(?i)^\s*(hi|hello|hey|thanks|thank you|ok|okay)\b").unwrap(),
        },
        Rule {
            complexity: Complexity::Simple,
            priority: 0,
            pattern: Regex::new(r"(?i)^\s*what\s+is\s+\w+\??\s*$").unwrap(),
        },
        Rule {
            complexity: Complexity::Complex,
            priority: 1,
            pattern: Regex::new(
                r"(?i)\b(architecture|trade-?off|evaluate|strategy|long-?term|multi-?step|root cause|systemic|comprehensive)\b",
            )
            .unwrap(),
        },
        Rule {
            complexity: Complexity::Complex,
            priority: 1,
            pattern: Regex::new(r"(?i)\b(compare|contrast)\b.+\b(and|versus|vs\.?)\b").unwrap(),
        },
    ]
}

/// Classifies a query into `Simple | Standard | Complex`. Checks rules in
/// priority order (simple first, then complex) and defaults to `Standard`
/// when nothing matches.
pub fn classify(query: &str) -> Complexity {
    let mut sorted = rules();
    sorted.sort_by_key(|r| r.priority);

    for rule in &sorted {
        if rule.pattern.is_match(query) {
            return rule.complexity;
        }
    }
    Complexity::Standard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_classifies_as_simple() {
        assert_eq!(classify("hello"), Complexity::Simple);
        assert_eq!(classify("Hi there"), Complexity::Simple);
    }

    #[test]
    fn architecture_question_classifies_as_complex() {
        assert_eq!(classify("What trade-offs exist in this architecture?"), Complexity::Complex);
    }

    #[test]
    fn unremarkable_query_defaults_to_standard() {
        assert_eq!(classify("why did the build fail yesterday"), Complexity::Standard);
    }

    #[test]
    fn effort_table_matches_the_fixed_mapping() {
        assert_eq!(Complexity::Simple.effort(), Effort::Medium);
        assert_eq!(Complexity::Standard.effort(), Effort::High);
        assert_eq!(Complexity::Complex.effort(), Effort::Max);
    }
}
