//! Implicit Reference Rewriting
//!
//! Legacy configs refer to each other by writing another config's template id
//! literally into their content. This pass turns every such occurrence into a
//! `{{ .__ref_<id> }}` placeholder backed by a synthesized Reference parameter,
//! so the graph builder sees a single kind of reference.
//!
//! The scan is a substring heuristic and can produce false positives when two
//! unrelated configs share a piece of text. Dashboards are the worst offenders
//! (embedded links and markdown), so no implicit reference is created between
//! two dashboard-like configs.

use shared_types::template::Placeholder;
use shared_types::{Config, Coordinate, Parameter, ReferenceParameter, Template, IMPLICIT_REFERENCE_PREFIX};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Template ids shorter than this are too likely to match by accident.
pub const MIN_TEMPLATE_ID_LEN: usize = 3;

/// A config that other configs may refer to by template id.
struct Target {
    template_id: String,
    coordinate: Coordinate,
    environment: String,
    dashboard_like: bool,
}

/// Rewrite literal template-id occurrences into reference parameters.
///
/// Returns the number of reference parameters synthesized. Configs whose
/// template content is malformed are left untouched; the graph builder
/// reports them.
pub fn rewrite_implicit_references(configs: &mut [Config]) -> usize {
    let targets = collect_targets(configs);
    let mut synthesized = 0;

    for config in configs.iter_mut() {
        if config.template.validate().is_err() {
            continue;
        }

        for target in &targets {
            if target.coordinate == config.coordinate
                || target.environment != config.environment
                || (target.dashboard_like && config.resource_type.is_dashboard_like())
            {
                continue;
            }

            if rewrite_one(config, target) {
                synthesized += 1;
                debug!(
                    coordinate = %config.coordinate,
                    target = %target.coordinate,
                    template_id = %target.template_id,
                    "Rewrote implicit reference"
                );
            }
        }
    }

    synthesized
}

/// Targets ordered longest template id first, so a short id never claims a
/// prefix of a longer one. Ids shared by several configs of one environment
/// are ambiguous and dropped.
fn collect_targets(configs: &[Config]) -> Vec<Target> {
    let mut seen: HashMap<(&str, &str), usize> = HashMap::new();
    for config in configs {
        *seen
            .entry((config.environment.as_str(), config.template.id.as_str()))
            .or_default() += 1;
    }

    let mut targets: Vec<Target> = configs
        .iter()
        .filter(|c| c.template.id.len() >= MIN_TEMPLATE_ID_LEN)
        .filter(|c| {
            let unique = seen[&(c.environment.as_str(), c.template.id.as_str())] == 1;
            if !unique {
                trace!(template_id = %c.template.id, "Ambiguous template id, not scanned");
            }
            unique
        })
        .map(|c| Target {
            template_id: c.template.id.clone(),
            coordinate: c.coordinate.clone(),
            environment: c.environment.clone(),
            dashboard_like: c.resource_type.is_dashboard_like(),
        })
        .collect();

    // Stable: equal lengths keep discovery order
    targets.sort_by(|a, b| b.template_id.len().cmp(&a.template_id.len()));
    targets
}

fn rewrite_one(config: &mut Config, target: &Target) -> bool {
    let Ok(placeholders) = config.template.placeholders() else {
        return false;
    };

    let name = parameter_name(config, target);
    let token = Template::placeholder_for(&name);
    let Some(content) =
        replace_outside_placeholders(&config.template.content, &placeholders, &target.template_id, &token)
    else {
        return false;
    };

    config.template.content = content;
    config.parameters.insert(
        name,
        Parameter::Reference(ReferenceParameter::to_id(target.coordinate.clone())),
    );
    true
}

/// Parameter name for a reference to `target`, unique within `config`.
fn parameter_name(config: &Config, target: &Target) -> String {
    let base = format!("{}{}", IMPLICIT_REFERENCE_PREFIX, sanitize(&target.template_id));
    let mut name = base.clone();
    let mut n = 1;

    loop {
        match config.parameters.get(&name).and_then(Parameter::as_reference) {
            Some(existing) if existing.coordinate == target.coordinate => return name,
            None if !config.parameters.contains_key(&name) => return name,
            _ => {
                n += 1;
                name = format!("{base}_{n}");
            }
        }
    }
}

fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Replace `needle` with `token` in the literal parts of `content`.
///
/// Returns `None` when nothing was replaced.
fn replace_outside_placeholders(
    content: &str,
    placeholders: &[Placeholder],
    needle: &str,
    token: &str,
) -> Option<String> {
    let mut out = String::with_capacity(content.len());
    let mut replaced = false;
    let mut cursor = 0;

    let literal_ends = placeholders
        .iter()
        .map(|p| (p.start, p.end))
        .chain(std::iter::once((content.len(), content.len())));

    for (start, end) in literal_ends {
        let literal = &content[cursor..start];
        if literal.contains(needle) {
            replaced = true;
            out.push_str(&literal.replace(needle, token));
        } else {
            out.push_str(literal);
        }
        out.push_str(&content[start..end]);
        cursor = end;
    }

    replaced.then_some(out)
}
