use super::Engine;

/// Provider voice catalog. The start path consults it before claiming, so a
/// bad voice comes back as a synchronous rejection instead of an
/// asynchronous FAILED job.
pub trait VoiceCatalog: Send + Sync {
    fn contains(&self, voice: &str) -> bool;

    /// Whether the voice can be synthesized with the given engine.
    fn supports_engine(&self, voice: &str, engine: Engine) -> bool;
}

/// Static catalog of the baseline provider's voices. Every listed voice
/// speaks the standard engine; the flag marks neural support.
pub struct StaticVoiceCatalog {
    entries: Vec<(String, bool)>,
}

impl StaticVoiceCatalog {
    pub fn new(entries: Vec<(String, bool)>) -> Self {
        Self { entries }
    }

    fn find(&self, voice: &str) -> Option<&(String, bool)> {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(voice))
    }
}

impl Default for StaticVoiceCatalog {
    fn default() -> Self {
        let entries = [
            ("Joanna", true),
            ("Matthew", true),
            ("Ivy", true),
            ("Joey", true),
            ("Kendra", true),
            ("Kimberly", true),
            ("Salli", true),
            ("Amy", true),
            ("Brian", true),
            ("Emma", true),
            ("Lucia", true),
            ("Lea", true),
            ("Vicki", true),
            ("Conchita", false),
            ("Enrique", false),
            ("Celine", false),
            ("Marlene", false),
            ("Russell", false),
            ("Nicole", false),
        ];
        Self::new(
            entries
                .into_iter()
                .map(|(name, neural)| (name.to_string(), neural))
                .collect(),
        )
    }
}

impl VoiceCatalog for StaticVoiceCatalog {
    fn contains(&self, voice: &str) -> bool {
        self.find(voice).is_some()
    }

    fn supports_engine(&self, voice: &str, engine: Engine) -> bool {
        match self.find(voice) {
            None => false,
            Some((_, neural)) => match engine {
                Engine::Standard => true,
                Engine::Neural => *neural,
            },
        }
    }
}
