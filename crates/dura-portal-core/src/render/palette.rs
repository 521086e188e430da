use crate::normalize::InsightKind;

/// Colors for one insight row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub accent: &'static str,
    pub background: &'static str,
}

const INFO: Swatch = Swatch {
    accent: "#2563eb",
    background: "#eff6ff",
};
const WARNING: Swatch = Swatch {
    accent: "#d97706",
    background: "#fffbeb",
};
const SUCCESS: Swatch = Swatch {
    accent: "#16a34a",
    background: "#f0fdf4",
};

pub fn swatch(kind: InsightKind) -> Swatch {
    match kind {
        InsightKind::Info => INFO,
        InsightKind::Warning => WARNING,
        InsightKind::Success => SUCCESS,
    }
}

/// Class used on dashboard action chips. Only warnings stand out.
pub fn action_class(raw: Option<&str>) -> &'static str {
    match InsightKind::parse(raw) {
        InsightKind::Warning => "warning",
        InsightKind::Info | InsightKind::Success => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_uses_info_colors() {
        assert_eq!(swatch(InsightKind::parse(Some("critical"))), INFO);
        assert_eq!(swatch(InsightKind::parse(None)), INFO);
        assert_eq!(swatch(InsightKind::parse(Some("warning"))).accent, "#d97706");
    }

    #[test]
    fn action_classes() {
        assert_eq!(action_class(Some("warning")), "warning");
        assert_eq!(action_class(Some("success")), "info");
        assert_eq!(action_class(Some("whatever")), "info");
    }
}
