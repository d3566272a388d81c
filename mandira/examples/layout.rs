use mandira::Template;
use serde::Serialize;

#[derive(Serialize)]
pub struct Page {
    title: String,
    items: Vec<&'static str>,
}

const LAYOUT_TEMPLATE: &str = r#"<!doctype html>
<html>
  <body>{{{content}}}</body>
</html>"#;
const PAGE_TEMPLATE: &str = r#"<h1>{{title|title}}</h1>
<ul>
{{#items}}
  <li>{{.index1}}. {{.}}</li>
{{/items}}
</ul>"#;

fn main() -> Result<(), mandira::Error> {
    let layout = Template::new_named("layout.mnd", LAYOUT_TEMPLATE)?;
    let page = Template::new_named("page.mnd", PAGE_TEMPLATE)?;
    let ctx = Page {
        title: "my shopping list".into(),
        items: vec!["eggs", "milk & honey"],
    };
    println!("{}", page.render_in_layout(&layout, &ctx));
    Ok(())
}
