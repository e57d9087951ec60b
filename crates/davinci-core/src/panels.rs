/// Visibility of the side panels around the chat.
///
/// Pure presentation state; it never affects the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panels {
    pub tools: bool,
    pub branding: bool,
}

impl Panels {
    pub fn toggle_tools(&mut self) {
        self.tools = !self.tools;
    }

    pub fn toggle_branding(&mut self) {
        self.branding = !self.branding;
    }
}

impl Default for Panels {
    fn default() -> Self {
        Self {
            tools: true,
            branding: true,
        }
    }
}

/// Entries listed in the tools panel
pub const TOOLS: [(&str, &str); 3] = [
    ("🔍", "Data Search"),
    ("🔬", "Data Research"),
    ("⚙", "Workflow"),
];

pub const BRAND_NAME: &str = "Davinci";
pub const BRAND_TAGLINE: &str = "Your AI Knowledge Assistant";

/// (icon, title, description) shown in the branding panel
pub const BRAND_FEATURES: [(&str, &str, &str); 3] = [
    ("🧠", "Smart Search", "Find answers in your documents instantly"),
    ("📚", "Knowledge Base", "Upload and organize your documents"),
    ("💬", "Natural Chat", "Ask questions in plain language"),
];
