//! Up-front validation of a startup document.
//!
//! A malformed document would otherwise surface as a hang (a `waitFor` that
//! never completes) or as components that exhaust their retry rounds. Hard
//! errors are collected and returned together as one `BootError::Config`;
//! suspicious but runnable setups are reported as warnings.

use super::types::{MountPoint, PhaseSpec, StartupConfig};
use bootlite_shared::errors::{BootError, BootResult};
use std::collections::{HashMap, HashSet};

/// Non-fatal findings of a successful validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Emit every warning through tracing.
    pub fn log(&self) {
        for warning in &self.warnings {
            tracing::warn!("{}", warning);
        }
    }
}

/// Where a component is declared.
struct Declaration {
    phase_index: usize,
    required: bool,
    enabled: bool,
}

/// Validate a startup configuration.
///
/// # Errors
///
/// Returns `BootError::Config` listing every problem found if:
/// - a phase or component name is empty or declared twice
/// - a component has an empty locator
/// - `waitFor` names the phase itself, an unknown phase, or a later phase
/// - a dependency, `appendTo` or `connectTo` names an undeclared component
/// - dependencies form a cycle
/// - `maxConcurrentLoads` or `timeoutMs` is zero
pub fn validate(config: &StartupConfig) -> BootResult<ValidationReport> {
    let mut errors = Vec::new();
    let mut report = ValidationReport::default();

    let performance = config.performance();
    if performance.max_concurrent_loads == 0 {
        errors.push("performance.maxConcurrentLoads must be at least 1".to_string());
    }
    if performance.timeout_ms == 0 {
        errors.push("performance.timeoutMs must be greater than 0".to_string());
    }

    // Phase names and barriers
    let mut phase_index: HashMap<&str, usize> = HashMap::new();
    for (index, phase) in config.phases().iter().enumerate() {
        if phase.name.is_empty() {
            errors.push(format!("phase #{} has an empty name", index));
        } else if phase_index.insert(phase.name.as_str(), index).is_some() {
            errors.push(format!("phase '{}' is declared more than once", phase.name));
        }

        if let Some(target) = phase.wait_for.as_deref() {
            if target == phase.name {
                errors.push(format!("phase '{}' waits for itself", phase.name));
            } else {
                match phase_index.get(target) {
                    Some(&waited) if config.phases()[waited].defer => {
                        report.warnings.push(format!(
                            "phase '{}' waits for deferred phase '{}'; it blocks until that phase runs",
                            phase.name, target
                        ))
                    }
                    Some(_) => {}
                    None if config.phase(target).is_some() => errors.push(format!(
                        "phase '{}' waits for '{}', which is declared later",
                        phase.name, target
                    )),
                    None => errors.push(format!(
                        "phase '{}' waits for unknown phase '{}'",
                        phase.name, target
                    )),
                }
            }
        }
    }

    // Component names
    let mut declared: HashMap<&str, Declaration> = HashMap::new();
    for (index, phase) in config.phases().iter().enumerate() {
        for component in &phase.components {
            if component.name.is_empty() {
                errors.push(format!("phase '{}' has a component with an empty name", phase.name));
                continue;
            }
            if component.path.is_empty() {
                errors.push(format!("component '{}' has an empty path", component.name));
            }
            let previous = declared.insert(
                component.name.as_str(),
                Declaration {
                    phase_index: index,
                    required: component.required,
                    enabled: component.enabled,
                },
            );
            if previous.is_some() {
                errors.push(format!(
                    "component '{}' is declared more than once",
                    component.name
                ));
            }
        }
    }

    // References
    for (index, phase) in config.phases().iter().enumerate() {
        for component in &phase.components {
            for dep in &component.dependencies {
                match declared.get(dep.as_str()) {
                    None => errors.push(format!(
                        "component '{}' depends on undeclared component '{}'",
                        component.name, dep
                    )),
                    Some(target) => {
                        if target.phase_index > index {
                            report.warnings.push(format!(
                                "component '{}' depends on '{}' from later phase '{}'; it will exhaust its retry rounds",
                                component.name, dep, config.phases()[target.phase_index].name
                            ));
                        }
                        if !target.enabled {
                            report.warnings.push(format!(
                                "component '{}' depends on disabled component '{}'",
                                component.name, dep
                            ));
                        }
                        if component.required && !target.required {
                            report.warnings.push(format!(
                                "required component '{}' depends on optional component '{}'",
                                component.name, dep
                            ));
                        }
                    }
                }
            }

            for arg in component
                .constructor_args
                .iter()
                .chain(component.init_args.iter())
            {
                if let Some(dep) = arg.dependency()
                    && !component.dependencies.iter().any(|d| d == dep)
                {
                    report.warnings.push(format!(
                        "component '{}' passes '{}' as an argument without declaring it as a dependency",
                        component.name, dep
                    ));
                }
            }

            if let Some(widget) = component.widget_config.as_ref() {
                if let MountPoint::Container(owner) = &widget.append_to
                    && !declared.contains_key(owner.as_str())
                {
                    errors.push(format!(
                        "widget '{}' is appended to undeclared component '{}'",
                        component.name, owner
                    ));
                }
                if let Some(target) = widget.connect_to.as_deref() {
                    if !declared.contains_key(target) {
                        errors.push(format!(
                            "widget '{}' connects to undeclared component '{}'",
                            component.name, target
                        ));
                    }
                    if widget.connect_method.is_none() {
                        report.warnings.push(format!(
                            "widget '{}' sets connectTo without connectMethod; no connection will be made",
                            component.name
                        ));
                    }
                }
                if !component.is_widget {
                    report.warnings.push(format!(
                        "component '{}' has widgetConfig but isWidget is false",
                        component.name
                    ));
                }

                for target in widget.targets() {
                    let Some(declaration) = declared.get(target) else {
                        continue;
                    };
                    if declaration.phase_index > index {
                        report.warnings.push(format!(
                            "widget '{}' needs '{}' from later phase '{}'; it will exhaust its retry rounds",
                            component.name, target, config.phases()[declaration.phase_index].name
                        ));
                    } else if declaration.phase_index == index
                        && !phase.parallel
                        && loads_after(phase, target, &component.name)
                    {
                        report.warnings.push(format!(
                            "widget '{}' needs '{}', which loads after it in sequential phase '{}'",
                            component.name, target, phase.name
                        ));
                    }
                }
            }
        }
    }

    if let Some(cycle) = find_dependency_cycle(config) {
        errors.push(format!("dependency cycle: {}", cycle.join(" -> ")));
    }

    if errors.is_empty() {
        Ok(report)
    } else {
        Err(BootError::Config(errors.join("; ")))
    }
}

/// True when `target` comes after `component` in the phase's load order.
fn loads_after(phase: &PhaseSpec, target: &str, component: &str) -> bool {
    let order = phase.enabled_components();
    let position = |name: &str| order.iter().position(|c| c.name == name);
    match (position(target), position(component)) {
        (Some(t), Some(c)) => t > c,
        _ => false,
    }
}

/// Find one dependency cycle across the whole document, if any.
///
/// Widget mount and connect targets count as edges.
///
/// Returns the cycle as a path that starts and ends with the same name.
fn find_dependency_cycle(config: &StartupConfig) -> Option<Vec<String>> {
    let edges: HashMap<&str, Vec<&str>> = config
        .phases()
        .iter()
        .flat_map(|p| p.components.iter())
        .map(|c| {
            (
                c.name.as_str(),
                c.dependencies
                    .iter()
                    .map(String::as_str)
                    .chain(c.widget_config.iter().flat_map(|w| w.targets()))
                    .collect(),
            )
        })
        .collect();

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        node: &'a str,
        edges: &HashMap<&'a str, Vec<&'a str>>,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        match marks.get(node) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|n| *n == node).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(node.to_string());
                return Some(cycle);
            }
            None => {}
        }

        marks.insert(node, Mark::Visiting);
        stack.push(node);
        for dep in edges.get(node).into_iter().flatten() {
            // Undeclared names are reported separately
            if !edges.contains_key(dep) {
                continue;
            }
            if let Some(cycle) = visit(*dep, edges, marks, stack) {
                return Some(cycle);
            }
        }
        stack.pop();
        marks.insert(node, Mark::Done);
        None
    }

    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    let mut seen = HashSet::new();
    for phase in config.phases() {
        for component in &phase.components {
            if !seen.insert(component.name.as_str()) {
                continue;
            }
            if let Some(cycle) = visit(component.name.as_str(), &edges, &mut marks, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}
