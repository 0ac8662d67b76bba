use bitflags::bitflags;

bitflags! {
    /// Kind filter and matching modifiers for a query.
    ///
    /// The four kind bits select which entity kinds may appear in results;
    /// `CASE_SENSITIVE` and `EXACT_MATCH` compose freely with any of them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SearchFlags: u32 {
        const MODULES = 1 << 0;
        const CLASSES = 1 << 1;
        const METHODS = 1 << 2;
        const FIELDS = 1 << 3;

        const CASE_SENSITIVE = 1 << 8;
        const EXACT_MATCH = 1 << 9;

        const ALL = Self::MODULES.bits()
            | Self::CLASSES.bits()
            | Self::METHODS.bits()
            | Self::FIELDS.bits();
    }
}

impl SearchFlags {
    /// Only the entity-kind bits
    pub fn kinds(self) -> SearchFlags {
        self & SearchFlags::ALL
    }

    pub fn is_exact(self) -> bool {
        self.contains(SearchFlags::EXACT_MATCH)
    }

    pub fn is_case_sensitive(self) -> bool {
        self.contains(SearchFlags::CASE_SENSITIVE)
    }
}

impl Default for SearchFlags {
    fn default() -> Self {
        SearchFlags::ALL
    }
}
