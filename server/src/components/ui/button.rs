use maud::{html, Markup, Render};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonVariant {
    Primary,
    Secondary,
    Danger,
}

impl ButtonVariant {
    fn classes(self) -> &'static str {
        match self {
            ButtonVariant::Primary => "bg-indigo-600 hover:bg-indigo-700 text-white",
            ButtonVariant::Secondary => "bg-gray-100 hover:bg-gray-200 text-gray-800",
            ButtonVariant::Danger => "bg-red-600 hover:bg-red-700 text-white",
        }
    }
}

pub struct Button {
    pub label: String,
    pub variant: ButtonVariant,
    pub href: Option<String>,
    pub button_type: Option<String>,
    pub full_width: bool,
}

impl Button {
    pub fn primary(label: &str) -> Self {
        Self::new(label, ButtonVariant::Primary)
    }

    pub fn secondary(label: &str) -> Self {
        Self::new(label, ButtonVariant::Secondary)
    }

    pub fn danger(label: &str) -> Self {
        Self::new(label, ButtonVariant::Danger)
    }

    fn new(label: &str, variant: ButtonVariant) -> Self {
        Self {
            label: label.to_string(),
            variant,
            href: None,
            button_type: None,
            full_width: false,
        }
    }

    /// Render as a link instead of a form button.
    pub fn href(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }

    pub fn button_type(mut self, button_type: &str) -> Self {
        self.button_type = Some(button_type.to_string());
        self
    }

    pub fn full_width(mut self, full_width: bool) -> Self {
        self.full_width = full_width;
        self
    }

    fn classes(&self) -> String {
        let width = if self.full_width { "w-full " } else { "" };
        format!(
            "{width}inline-flex justify-center items-center px-4 py-2 text-sm font-medium rounded-md transition-colors {}",
            self.variant.classes()
        )
    }
}

impl Render for Button {
    fn render(&self) -> Markup {
        match &self.href {
            Some(href) => html! {
                a href=(href) class=(self.classes()) { (self.label) }
            },
            None => html! {
                button type=(self.button_type.as_deref().unwrap_or("submit")) class=(self.classes()) {
                    (self.label)
                }
            },
        }
    }
}
