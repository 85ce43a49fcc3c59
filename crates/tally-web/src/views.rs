//! HTML rendering. Templates are embedded in the binary and loaded once.

use axum::response::Html;
use rust_embed::Embed;
use tera::{Context, Tera};

use crate::error::Result;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

/// Compiled page templates.
pub struct Views {
  tera: Tera,
}

impl Views {
  /// Compile every embedded template. Inheritance is resolved across the
  /// whole set, so pages may `{% extends "base.html" %}`.
  pub fn new() -> Result<Self> {
    let mut sources = Vec::new();
    for file in EmbeddedTemplates::iter() {
      if let Some(content) = EmbeddedTemplates::get(&file) {
        let body = String::from_utf8_lossy(&content.data).into_owned();
        sources.push((file.into_owned(), body));
      }
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(sources)?;
    Ok(Self { tera })
  }

  pub fn render(&self, name: &str, context: &Context) -> Result<Html<String>> {
    Ok(Html(self.tera.render(name, context)?))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_page_is_embedded() {
    let views = Views::new().unwrap();
    let mut names: Vec<_> = views.tera.get_template_names().collect();
    names.sort_unstable();
    assert_eq!(names, [
      "base.html",
      "catalog.html",
      "incident_form.html",
      "pin.html",
      "report.html",
      "settings.html",
    ]);
  }

  #[test]
  fn output_is_escaped() {
    let views = Views::new().unwrap();
    let mut ctx = Context::new();
    ctx.insert("target", "/report");
    ctx.insert("wrong", &false);
    ctx.insert("title", "<script>");
    let html = views.render("pin.html", &ctx).unwrap().0;
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
  }
}
