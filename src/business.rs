use once_cell::sync::Lazy;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

pub const COMPANY_NAME: &str = "XPAC Technology";
pub const CEO: &str = "Sanda";
pub const HOURS: &str = "Mon-Thu 9-5, Fri 9-3";
pub const LOCATION: &str = "186 Logistics Way, LA";
pub const PHONE: &str = "(310) 555-0187";

/// Services XPAC offers, in catalog order
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum Service {
    #[strum(to_string = "Industrial Packaging")]
    IndustrialPackaging,
    #[strum(to_string = "Smart Tracking (Traxx Smart)")]
    SmartTracking,
    #[strum(to_string = "Eco-Friendly Solutions")]
    EcoFriendly,
    #[strum(to_string = "Custom Branding & Design")]
    CustomBranding,
    #[strum(to_string = "E-commerce Logistics")]
    Ecommerce,
    #[strum(to_string = "Protective Engineering")]
    ProtectiveEngineering,
}

impl Service {
    pub fn title(&self) -> &'static str {
        self.into()
    }
}

/// Staff the assistant is allowed to talk about
pub const TEAM: &[(&str, &str)] = &[
    ("James Carter", "Head of Operations"),
    ("Sofia Rodriguez", "Lead Product Designer"),
    ("Maria Lopez", "Supply Chain Strategist"),
    ("Olivia Carter", "Sustainability Engineer"),
];

static SYSTEM_INSTRUCTION: Lazy<String> = Lazy::new(|| {
    let services = Service::iter()
        .map(|s| s.title())
        .collect::<Vec<_>>()
        .join(", ");
    let team = TEAM
        .iter()
        .map(|(name, role)| format!("{name} ({role})"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are a helpful and professional AI assistant for "{COMPANY_NAME}".
Company Details:
- Services: {services}.
- CEO: {CEO}.
- Team: {team}.
- Hours: {HOURS}.
- Location: {LOCATION}.
Answer briefly and professionally. Encourage users to request a consultation."#
    )
});

/// The fixed business-context prompt sent with every completion request.
pub fn system_instruction() -> &'static str {
    &SYSTEM_INSTRUCTION
}
