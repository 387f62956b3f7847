use maud::{html, Markup, Render};

pub struct Heading {
    pub text: String,
    pub level: u8,
    pub color: Option<String>,
    pub extra_classes: Option<String>,
}

impl Heading {
    pub fn h1(text: &str) -> Self {
        Self {
            text: text.to_string(),
            level: 1,
            color: None,
            extra_classes: None,
        }
    }

    pub fn h2(text: &str) -> Self {
        Self {
            text: text.to_string(),
            level: 2,
            color: None,
            extra_classes: None,
        }
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    pub fn with_classes(mut self, classes: &str) -> Self {
        self.extra_classes = Some(classes.to_string());
        self
    }

    fn classes(&self) -> String {
        let size = match self.level {
            1 => "text-2xl font-bold",
            _ => "text-xl font-semibold",
        };
        format!(
            "{size} {} {}",
            self.color.as_deref().unwrap_or("text-gray-800"),
            self.extra_classes.as_deref().unwrap_or("")
        )
    }
}

impl Render for Heading {
    fn render(&self) -> Markup {
        match self.level {
            1 => html! { h1 class=(self.classes()) { (self.text) } },
            _ => html! { h2 class=(self.classes()) { (self.text) } },
        }
    }
}
