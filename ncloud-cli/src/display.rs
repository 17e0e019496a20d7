use colored::{ColoredString, Colorize};

use ncloud_core::effect::Effect;
use ncloud_core::plan::Plan;
use ncloud_core::resource::{Attributes, Value};
use ncloud_core::schema::{AttributeSchema, ResourceSchema};

const ATTR_INDENT: &str = "      ";

fn symbol(effect: &Effect) -> ColoredString {
    match effect {
        Effect::Read(_) => "<=".cyan().bold(),
        Effect::Create(_) => "+".green().bold(),
        Effect::Update { .. } => "~".yellow().bold(),
        Effect::Replace { .. } => "-/+".magenta().bold(),
        Effect::Delete(_) => "-".red().bold(),
    }
}

/// Attribute keys with "name" first, then alphabetical
fn sorted_keys(attributes: &Attributes) -> Vec<&String> {
    let mut keys: Vec<&String> = attributes.keys().collect();
    keys.sort_by(|a, b| match (a.as_str(), b.as_str()) {
        ("name", _) => std::cmp::Ordering::Less,
        (_, "name") => std::cmp::Ordering::Greater,
        _ => a.cmp(b),
    });
    keys
}

pub fn print_plan(plan: &Plan) {
    if plan.mutation_count() == 0 {
        for effect in plan.effects() {
            println!("  {} {}", symbol(effect), effect.id().to_string().cyan());
        }
        println!("{}", "No changes. Infrastructure is up-to-date.".green());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for effect in plan.effects() {
        println!("  {} {}", symbol(effect), effect.id().to_string().cyan().bold());
        match effect {
            Effect::Read(_) => {}
            Effect::Create(r) => {
                for key in sorted_keys(&r.attributes) {
                    println!(
                        "{}{}: {}",
                        ATTR_INDENT,
                        key,
                        format_value(&r.attributes[key]).green()
                    );
                }
            }
            Effect::Update { from, to, .. } | Effect::Replace { from, to, .. } => {
                for key in sorted_keys(&to.attributes) {
                    let new_value = &to.attributes[key];
                    let old_value = from.attributes.get(key);
                    if old_value == Some(new_value) {
                        continue;
                    }
                    let old_str = old_value
                        .map(format_value)
                        .unwrap_or_else(|| "(none)".to_string());
                    println!(
                        "{}{}: {} → {}",
                        ATTR_INDENT,
                        key,
                        old_str.red(),
                        format_value(new_value).green()
                    );
                }
            }
            Effect::Delete(state) => {
                if let Some(identifier) = &state.identifier {
                    println!("{}{}: {}", ATTR_INDENT, "identifier".bold(), identifier.red());
                }
            }
        }
    }

    println!();
    let summary = plan.summary();
    println!(
        "Plan: {} to create, {} to update, {} to replace, {} to delete.",
        summary.create.to_string().green(),
        summary.update.to_string().yellow(),
        summary.replace.to_string().magenta(),
        summary.delete.to_string().red()
    );
}

/// Print data source results, one block per declaration
pub fn print_attributes(title: &str, attributes: &Attributes) {
    println!("  {} {}", "<=".cyan().bold(), title.cyan().bold());
    for key in sorted_keys(attributes) {
        println!("{}{}: {}", ATTR_INDENT, key, format_value(&attributes[key]));
    }
}

pub fn format_effect(effect: &Effect) -> String {
    match effect {
        Effect::Read(r) => format!("Read {}", r.id),
        Effect::Create(r) => format!("Create {}", r.id),
        Effect::Update { id, .. } => format!("Update {}", id),
        Effect::Replace { id, .. } => format!("Replace {}", id),
        Effect::Delete(state) => format!("Delete {}", state.id),
    }
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            let strs: Vec<_> = keys
                .into_iter()
                .map(|k| format!("{}: {}", k, format_value(&map[k])))
                .collect();
            format!("{{{}}}", strs.join(", "))
        }
    }
}

fn attribute_flags(attr: &AttributeSchema) -> String {
    let mut flags = Vec::new();
    if attr.required {
        flags.push("required");
    } else if attr.is_read_only() {
        flags.push("read-only");
    } else {
        flags.push("optional");
    }
    if attr.computed && !attr.is_read_only() {
        flags.push("computed");
    }
    if attr.force_new {
        flags.push("force-new");
    }
    flags.join(", ")
}

pub fn print_schema(kind: &str, schema: &ResourceSchema) {
    println!("{} {}", kind.dimmed(), schema.resource_type.cyan().bold());
    if let Some(description) = &schema.description {
        println!("  {}", description);
    }

    let mut names: Vec<&String> = schema.attributes.keys().collect();
    names.sort();
    for name in names {
        let attr = &schema.attributes[name];
        let line = format!("  {}: {} ({})", name, attr.attr_type, attribute_flags(attr));
        match &attr.description {
            Some(description) => println!("{}  {}", line, description.dimmed()),
            None => println!("{}", line),
        }
    }
    println!();
}
