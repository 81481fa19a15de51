//! Renders one module's documentation model into a markdown page.
//!
//! Heading depth is passed explicitly: a plain module page starts at level 1
//! with its Enums/Methods/Classes sections at 2, a class-module page renders
//! its class at level 1 with Fields/Methods at 2.

use super::document::{Align, Document};
use crate::links::{LinkMode, LinkRewriter};
use crate::model::{Class, Field, Function, LuaType, Module, Param, Return, Visibility};

pub struct PageRenderer<'a> {
    links: LinkRewriter<'a>,
    doc: Document,
}

/// Description overrides used when a class-module renders its class.
struct ClassHeading<'m> {
    name: &'m str,
    short_desc: &'m str,
    desc: &'m str,
}

impl<'a> PageRenderer<'a> {
    pub fn new(links: LinkRewriter<'a>) -> Self {
        Self {
            links,
            doc: Document::new(),
        }
    }

    /// Render `module` and return the finished document.
    pub fn render(mut self, module: &Module) -> Document {
        self.add_module(module);
        self.doc
    }

    fn raw(&mut self, text: &str) {
        let text = self.links.link(text);
        self.doc.raw(&text);
    }

    fn bold(&mut self, text: &str) {
        let text = self.links.link(text);
        self.doc.bold(&text);
    }

    fn add_module(&mut self, module: &Module) {
        if let Some(class) = module.primary_class() {
            let heading = ClassHeading {
                name: &module.name,
                short_desc: non_empty_or(&module.short_desc, &class.short_desc),
                desc: non_empty_or(&module.desc, &class.desc),
            };
            self.add_class(class, Some(heading), 1);
            return;
        }

        self.doc.heading(&module.name, 1);
        self.raw(&module.short_desc);
        self.raw(&module.desc);
        self.doc.rule();

        let enums: Vec<&Class> = module.classes.iter().filter(|c| c.is_enum).collect();
        let classes: Vec<&Class> = module.classes.iter().filter(|c| !c.is_enum).collect();

        if !enums.is_empty() {
            self.doc.heading("Enums", 2);
            for class in enums {
                self.add_enum(class, 3);
            }
        }

        if module.functions.iter().any(|f| !f.is_private()) {
            self.doc.heading("Methods", 2);
            for function in &module.functions {
                self.add_function(function, "", 3);
            }
        }

        if !classes.is_empty() {
            self.doc.heading("Classes", 2);
            for class in classes {
                self.add_class(class, None, 3);
            }
        }
    }

    fn add_class(&mut self, class: &Class, heading: Option<ClassHeading<'_>>, level: usize) {
        let (name, short_desc, desc) = match &heading {
            Some(h) => (h.name, h.short_desc, h.desc),
            None => (
                class.name.as_str(),
                class.short_desc.as_str(),
                class.desc.as_str(),
            ),
        };

        self.doc.heading(name, level);
        self.raw(short_desc);
        self.raw(desc);

        let fields: Vec<&Field> = class
            .fields
            .iter()
            .filter(|f| f.visibility != Visibility::Private)
            .collect();
        if !fields.is_empty() {
            self.doc.heading("Fields", level + 1);
            let items: Vec<String> = fields.iter().map(|f| self.field_item(f)).collect();
            self.doc.raw(&items.join("\n"));
        }

        if class.methods.iter().any(|m| !m.is_private()) {
            self.doc.heading("Methods", level + 1);
            let scope = format!("{}:", class.name);
            for method in &class.methods {
                self.add_function(method, &scope, level + 2);
            }
        }
    }

    fn field_item(&self, field: &Field) -> String {
        let mut item = format!("- `{}`", field.name);
        if let Some(ty) = &field.ty {
            item.push_str(&format!(" (<code>{}</code>)", self.type_string(ty, LinkMode::Link)));
        }
        if !field.desc.is_empty() {
            item.push_str(": ");
            item.push_str(&self.links.link(&field.desc));
        }
        item
    }

    fn add_enum(&mut self, class: &Class, level: usize) {
        self.doc.heading(&class.name, level);
        self.raw(&class.short_desc);
        self.raw(&class.desc);

        let rows: Vec<Vec<String>> = class
            .fields
            .iter()
            .map(|field| vec![format!("`{}`", field.name), self.links.link(&field.desc)])
            .collect();
        self.doc
            .table(&["Member", "Description"], &rows, &[Align::Left, Align::Left]);
    }

    fn add_function(&mut self, function: &Function, scope: &str, level: usize) {
        if function.is_private() {
            return;
        }

        self.doc.heading(&format!("{}()", function.name), level);
        self.bold("Signature");
        self.raw(&function.short_desc);
        let signature = self.signature(function, scope);
        self.doc.code(&signature, "lua");

        let params: Vec<Vec<String>> = function.params.iter().map(|p| self.param_row(p)).collect();
        self.doc.table(
            &["Parameter", "Type", "Description", "Default value"],
            &params,
            &[Align::Left, Align::Left, Align::Left, Align::Center],
        );

        if !function.returns.is_empty() {
            let returns: Vec<Vec<String>> =
                function.returns.iter().map(|r| self.return_row(r)).collect();
            self.doc
                .table(&["Type", "Description"], &returns, &[Align::Left, Align::Left]);
        }

        if !function.desc.is_empty() {
            self.bold("Notes");
            self.raw(&function.desc);
        }

        if let Some(usage) = &function.usage {
            self.bold("Usage");
            self.doc.code(usage, "lua");
        }

        self.doc.rule();
    }

    /// `function [Scope:]name(a: T, ...) -> R` (or `-> (R1, R2)`), without link markup.
    fn signature(&self, function: &Function, scope: &str) -> String {
        let arguments = function
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, self.type_string(&p.ty, LinkMode::Plain)))
            .collect::<Vec<_>>()
            .join(", ");
        let returns: Vec<String> = function
            .returns
            .iter()
            .map(|r| self.type_string(&r.ty, LinkMode::Plain))
            .collect();
        let returns = match returns.len() {
            0 => "nil".to_string(),
            1 => returns[0].clone(),
            _ => format!("({})", returns.join(", ")),
        };
        format!("function {}{}({}) -> {}", scope, function.name, arguments, returns)
    }

    fn param_row(&self, param: &Param) -> Vec<String> {
        let name = if param.is_opt {
            format!("`{}`", param.name)
        } else {
            format!("`{}`*", param.name)
        };
        vec![
            name,
            format!("<code>{}</code>", self.type_string(&param.ty, LinkMode::Link)),
            self.links.link(&param.desc),
            param.default_value.clone().unwrap_or_default(),
        ]
    }

    fn return_row(&self, ret: &Return) -> Vec<String> {
        vec![
            format!("<code>{}</code>", self.type_string(&ret.ty, LinkMode::Link)),
            self.links.link(&ret.desc),
        ]
    }

    fn type_string(&self, ty: &LuaType, mode: LinkMode) -> String {
        match ty {
            LuaType::Any => "any".to_string(),
            LuaType::Callable {
                arg_types,
                return_types,
            } => {
                let args = arg_types
                    .iter()
                    .map(|t| self.type_string(t, mode))
                    .collect::<Vec<_>>()
                    .join(", ");
                let returns: Vec<String> =
                    return_types.iter().map(|t| self.type_string(t, mode)).collect();
                let ret = if returns.len() == 1 {
                    returns[0].clone()
                } else {
                    format!("({})", returns.join(", "))
                };
                format!("function({}):{}", args, ret)
            }
            LuaType::Custom { name } => self.links.rewrite(name, mode),
            LuaType::Function { id } => self.links.rewrite(id, mode),
            LuaType::String => "string".to_string(),
            // Published pages have always labelled booleans this way.
            LuaType::Boolean => "string".to_string(),
        }
    }
}

fn non_empty_or<'s>(preferred: &'s str, fallback: &'s str) -> &'s str {
    if preferred.is_empty() {
        fallback
    } else {
        preferred
    }
}
