use maud::{html, Markup, Render};

pub struct InputField {
    pub name: String,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub value: Option<String>,
    pub input_type: String,
    pub required: bool,
    pub hidden: bool,
}

impl InputField {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            placeholder: None,
            value: None,
            input_type: "text".to_string(),
            required: false,
            hidden: false,
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn input_type(mut self, input_type: &str) -> Self {
        self.input_type = input_type.to_string();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

impl Render for InputField {
    fn render(&self) -> Markup {
        if self.hidden {
            return html! {
                input type="hidden" name=(self.name) value=(self.value.as_deref().unwrap_or("")) {}
            };
        }

        html! {
            div class="mb-4" {
                @if let Some(label) = &self.label {
                    label for=(self.name) class="block text-sm font-medium text-gray-700 mb-1" { (label) }
                }

                input
                    type=(self.input_type)
                    name=(self.name)
                    id=(self.name)
                    value=(self.value.as_deref().unwrap_or(""))
                    placeholder=(self.placeholder.as_deref().unwrap_or(""))
                    class="w-full px-4 py-2 border border-gray-300 rounded-lg focus:ring-2 focus:ring-indigo-500 focus:border-indigo-500 text-gray-900"
                    required[self.required] {}
            }
        }
    }
}

pub struct TextAreaField {
    pub name: String,
    pub label: Option<String>,
    pub value: Option<String>,
    pub rows: u32,
    pub required: bool,
}

impl TextAreaField {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            value: None,
            rows: 8,
            required: false,
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

impl Render for TextAreaField {
    fn render(&self) -> Markup {
        html! {
            div class="mb-4" {
                @if let Some(label) = &self.label {
                    label for=(self.name) class="block text-sm font-medium text-gray-700 mb-1" { (label) }
                }

                textarea
                    name=(self.name)
                    id=(self.name)
                    rows=(self.rows)
                    class="w-full px-4 py-2 border border-gray-300 rounded-lg focus:ring-2 focus:ring-indigo-500 focus:border-indigo-500 text-gray-900"
                    required[self.required] {
                    (self.value.as_deref().unwrap_or(""))
                }
            }
        }
    }
}

pub struct CheckboxField {
    pub name: String,
    pub label: String,
}

impl CheckboxField {
    pub fn new(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
        }
    }
}

impl Render for CheckboxField {
    fn render(&self) -> Markup {
        html! {
            div class="mb-4 flex items-center gap-2" {
                input type="checkbox" name=(self.name) id=(self.name) value="on"
                    class="h-4 w-4 rounded border-gray-300 text-indigo-600 focus:ring-indigo-500" {}
                label for=(self.name) class="text-sm text-gray-700" { (self.label) }
            }
        }
    }
}

pub struct Form {
    pub action: String,
    pub method: String,
    pub content: Box<dyn Render>,
    pub multipart: bool,
}

impl Form {
    pub fn new(action: &str, method: &str, content: impl Render + 'static) -> Self {
        Self {
            action: action.to_string(),
            method: method.to_string(),
            content: Box::new(content),
            multipart: false,
        }
    }

    /// File uploads need the multipart encoding.
    pub fn multipart(mut self, multipart: bool) -> Self {
        self.multipart = multipart;
        self
    }
}

impl Render for Form {
    fn render(&self) -> Markup {
        html! {
            @if self.multipart {
                form action=(self.action) method=(self.method) enctype="multipart/form-data" class="space-y-4" {
                    (self.content.render())
                }
            } @else {
                form action=(self.action) method=(self.method) class="space-y-4" {
                    (self.content.render())
                }
            }
        }
    }
}
