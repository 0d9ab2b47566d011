use crate::models::Topic;
use serde::Serialize;

/// Question counts offered on the setup screen.
pub const QUESTION_COUNT_OPTIONS: [usize; 4] = [20, 40, 50, 100];

/// Largest session a client may request.
pub const MAX_QUESTION_COUNT: usize = 100;

const TOPICS: &[(&str, &str, &str, &str)] = &[
    ("parts-of-speech", "Parts of Speech", "🏷️", "Nouns, Verbs, Adjectives, Adverbs, and more basic building blocks."),
    ("tenses", "Verb Tenses", "⏳", "Present, Past, and Future perfect/progressive tenses."),
    ("passive-voice", "Active & Passive", "🔄", "Mastering the art of switching voice in sentences."),
    ("conditionals", "Conditionals", "❓", "Zero, first, second, third, and mixed conditionals."),
    ("reported-speech", "Reported Speech", "🗣️", "Direct vs. Indirect speech and backshifting rules."),
    ("prepositions", "Prepositions", "📍", "In, on, at, by, through, and complex prepositional phrases."),
    ("articles", "Articles & Determiners", "🅰️", "A, an, the, and zero article usage in various contexts."),
    ("subject-verb-agreement", "S-V Agreement", "🤝", "Ensuring subjects and verbs match in number and person."),
    ("modals", "Modal Verbs", "🧠", "Can, could, might, shall, should, must, and their nuances."),
    ("relative-clauses", "Relative Clauses", "🔗", "Defining and non-defining clauses using who, which, that."),
    ("conjunctions", "Conjunctions", "🌉", "Coordinating, subordinating, and correlative connectors."),
    ("punctuation", "Punctuation", "✍️", "Commas, semicolons, colons, and apostrophe usage."),
    ("gerunds-infinitives", "Gerunds & Infinitives", "🎭", "Verbs followed by -ing vs. to + infinitive forms."),
    ("quantifiers", "Quantifiers", "🔢", "Much, many, few, little, some, and any usage."),
    ("adjective-order", "Adjective Order", "📐", "The natural sequence of adjectives: Opinion, Size, Age, etc."),
    ("question-tags", "Question Tags", "💬", "Adding mini-questions at the end of statements."),
    ("phrasal-verbs", "Phrasal Verbs", "🏃‍♂️", "Verbs combined with particles to create new meanings."),
    ("idioms", "Idioms & Phrases", "🎨", "Common figurative expressions used in everyday English."),
    ("comparatives", "Comparatives", "⚖️", "Forms for comparing people, things, and actions."),
    ("sentence-structure", "Sentence Structure", "🏗️", "Simple, compound, complex, and compound-complex sentences."),
    ("possessives", "Possessives", "🗝️", "Apostrophes, possessive adjectives, and possessive pronouns."),
    ("adverbs-frequency", "Adverbs of Frequency", "📊", "Always, usually, often, sometimes, rarely, and never."),
    ("inversion", "Inversion", "🔃", "Negative inversion and formal structures like \"Had I known\"."),
    ("causative-verbs", "Causative Verbs", "🛠️", "Using \"have\", \"get\", \"make\", and \"let\" to describe delegated actions."),
    ("hypotheticals", "Hypotheticals", "🧞", "Expressing wishes and regrets using \"I wish\" and \"If only\"."),
    ("linking-verbs", "Linking Verbs", "⛓️", "State verbs vs action verbs and how they function as connectors."),
    ("parallelism", "Parallelism", "🛤️", "Creating balance in sentences with consistent grammatical forms."),
    ("collective-nouns", "Collective Nouns", "👥", "Agreement rules with groups like team, family, and government."),
    ("word-formation", "Word Formation", "🧩", "Understanding how prefixes and suffixes change word classes."),
    ("advanced-articles", "Advanced Articles", "🔡", "Unique cases with geographical names and abstract concepts."),
];

/// Read-only list of practice topics, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct TopicCatalog {
    topics: Vec<Topic>,
}

impl TopicCatalog {
    pub fn builtin() -> Self {
        let topics = TOPICS
            .iter()
            .map(|(id, name, icon, description)| Topic {
                id: (*id).to_string(),
                name: (*name).to_string(),
                description: (*description).to_string(),
                icon: (*icon).to_string(),
            })
            .collect();
        Self { topics }
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn find(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_ids_are_unique() {
        let catalog = TopicCatalog::builtin();
        assert_eq!(catalog.topics().len(), 30);
        let ids: HashSet<_> = catalog.topics().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.topics().len());
    }

    #[test]
    fn find_by_id() {
        let catalog = TopicCatalog::builtin();
        assert_eq!(catalog.find("modals").unwrap().name, "Modal Verbs");
        assert!(catalog.find("klingon").is_none());
        assert_eq!(catalog.topics()[0].id, "parts-of-speech");
    }

    #[test]
    fn presets_fit_the_limit() {
        assert!(QUESTION_COUNT_OPTIONS.iter().all(|c| *c > 0 && *c <= MAX_QUESTION_COUNT));
    }
}
