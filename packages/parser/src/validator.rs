//! Structural validation of interpreted rules.
//!
//! Validation is advisory: it returns findings and never fails, so noisy
//! source text still produces output that can be corrected by hand.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::types::{
    Branch, BranchTarget, DecisionNode, SectionRules, SocKind, SpecificOffenseCharacteristic,
};

/// Id every decision tree must start from.
pub const ROOT_ID: &str = "base_1";

/// A structural problem found in a decision tree or SOC list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingRoot,
    MissingNodeId { index: usize },
    DuplicateNodeId { id: String },
    DanglingReference {
        node: String,
        branch: Branch,
        target: String,
    },
    MissingOutcome { node: String, branch: Branch },
    AmbiguousOutcome { node: String, branch: Branch },
    MissingBaseLevel { node: String, branch: Branch },
    Unreachable { node: String },
    SocMissingId { index: usize },
    SocMissingType { id: String },
    SocUnknownType { id: String, kind: String },
    SocMissingOptions { id: String },
    SocOptionMissingLabel { id: String, index: usize },
    SocMissingEffect { id: String, branch: Branch },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoot => write!(f, "Decision tree must start with '{ROOT_ID}'"),
            Self::MissingNodeId { index } => write!(f, "Question #{index} missing 'id' field"),
            Self::DuplicateNodeId { id } => write!(f, "Question id '{id}' is used more than once"),
            Self::DanglingReference {
                node,
                branch,
                target,
            } => write!(
                f,
                "{node}.{} references non-existent '{target}'",
                branch.next_key()
            ),
            Self::MissingOutcome { node, branch } => write!(
                f,
                "{node} has no {} or {}",
                branch.next_key(),
                branch.result_key()
            ),
            Self::AmbiguousOutcome { node, branch } => write!(
                f,
                "{node} has both {} and {}",
                branch.next_key(),
                branch.result_key()
            ),
            Self::MissingBaseLevel { node, branch } => {
                write!(f, "{node}.{} missing baseLevel", branch.result_key())
            }
            Self::Unreachable { node } => {
                write!(f, "Question '{node}' is not reachable from {ROOT_ID}")
            }
            Self::SocMissingId { index } => write!(f, "SOC #{index} missing 'id' field"),
            Self::SocMissingType { id } => write!(f, "{id} missing 'type' field"),
            Self::SocUnknownType { id, kind } => write!(f, "{id} has unknown type '{kind}'"),
            Self::SocMissingOptions { id } => write!(f, "{id} (select) missing options"),
            Self::SocOptionMissingLabel { id, index } => {
                write!(f, "{id} option #{index} missing label")
            }
            Self::SocMissingEffect { id, branch } => {
                let key = match branch {
                    Branch::Yes => "yesEffect",
                    Branch::No => "noEffect",
                };
                write!(f, "{id} (yesno) missing {key}")
            }
        }
    }
}

/// Validate a section's decision tree and SOC list.
pub fn validate(
    tree: &[DecisionNode],
    socs: &[SpecificOffenseCharacteristic],
) -> Vec<ValidationIssue> {
    let mut issues = validate_tree(tree);
    issues.extend(validate_socs(socs));
    issues
}

/// Validate a complete output entry.
pub fn validate_rules(rules: &SectionRules) -> Vec<ValidationIssue> {
    validate(
        &rules.base_offense_questions,
        &rules.specific_offense_characteristics,
    )
}

/// Check root presence, references, branch outcomes and reachability.
pub fn validate_tree(tree: &[DecisionNode]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut nodes: HashMap<&str, Vec<&DecisionNode>> = HashMap::new();

    for (index, node) in tree.iter().enumerate() {
        if node.id.is_empty() {
            issues.push(ValidationIssue::MissingNodeId { index });
            continue;
        }
        let copies = nodes.entry(node.id.as_str()).or_default();
        if !copies.is_empty() {
            issues.push(ValidationIssue::DuplicateNodeId {
                id: node.id.clone(),
            });
        }
        copies.push(node);
    }

    let has_root = nodes.contains_key(ROOT_ID);
    if !has_root {
        issues.push(ValidationIssue::MissingRoot);
    }

    for node in tree.iter().filter(|n| !n.id.is_empty()) {
        for branch in Branch::BOTH {
            match node.target(branch) {
                BranchTarget::Next(target) => {
                    if !nodes.contains_key(target) {
                        issues.push(ValidationIssue::DanglingReference {
                            node: node.id.clone(),
                            branch,
                            target: target.to_string(),
                        });
                    }
                }
                BranchTarget::Terminal(result) => {
                    if result.base_level.is_none() {
                        issues.push(ValidationIssue::MissingBaseLevel {
                            node: node.id.clone(),
                            branch,
                        });
                    }
                }
                BranchTarget::Missing => issues.push(ValidationIssue::MissingOutcome {
                    node: node.id.clone(),
                    branch,
                }),
                BranchTarget::Ambiguous => issues.push(ValidationIssue::AmbiguousOutcome {
                    node: node.id.clone(),
                    branch,
                }),
            }
        }
    }

    // Without a root every node would be reported; the missing root says it all.
    if has_root {
        let reachable = reachable_from_root(&nodes);
        let mut reported = HashSet::new();
        for node in tree.iter().filter(|n| !n.id.is_empty()) {
            if !reachable.contains(node.id.as_str()) && reported.insert(node.id.as_str()) {
                issues.push(ValidationIssue::Unreachable {
                    node: node.id.clone(),
                });
            }
        }
    }

    issues
}

/// Breadth-first walk over both branch edges, including ambiguous ones.
///
/// Every node sharing an id contributes its edges.
fn reachable_from_root<'a>(
    nodes: &HashMap<&'a str, Vec<&'a DecisionNode>>,
) -> HashSet<&'a str> {
    let mut reachable = HashSet::new();
    let mut queue: VecDeque<&'a str> = VecDeque::from([ROOT_ID]);

    while let Some(current) = queue.pop_front() {
        let Some((&id, copies)) = nodes.get_key_value(current) else {
            continue;
        };
        if !reachable.insert(id) {
            continue;
        }
        for node in copies {
            for next in Branch::BOTH.into_iter().filter_map(|branch| node.next(branch)) {
                if !reachable.contains(next) {
                    queue.push_back(next);
                }
            }
        }
    }

    reachable
}

/// Check that every SOC is identified, typed and complete for its type.
pub fn validate_socs(socs: &[SpecificOffenseCharacteristic]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (index, soc) in socs.iter().enumerate() {
        let Some(id) = soc.id.as_deref().filter(|id| !id.is_empty()) else {
            issues.push(ValidationIssue::SocMissingId { index });
            continue;
        };

        let Some(kind) = soc.kind.as_deref() else {
            issues.push(ValidationIssue::SocMissingType { id: id.to_string() });
            continue;
        };

        match SocKind::from_type(kind) {
            Some(SocKind::Select) => match soc.options.as_deref() {
                Some(options) if !options.is_empty() => {
                    for (index, option) in options.iter().enumerate() {
                        if option.label.trim().is_empty() {
                            issues.push(ValidationIssue::SocOptionMissingLabel {
                                id: id.to_string(),
                                index,
                            });
                        }
                    }
                }
                _ => issues.push(ValidationIssue::SocMissingOptions { id: id.to_string() }),
            },
            Some(SocKind::YesNo) => {
                if soc.yes_effect.is_none() {
                    issues.push(ValidationIssue::SocMissingEffect {
                        id: id.to_string(),
                        branch: Branch::Yes,
                    });
                }
                if soc.no_effect.is_none() {
                    issues.push(ValidationIssue::SocMissingEffect {
                        id: id.to_string(),
                        branch: Branch::No,
                    });
                }
            }
            None => issues.push(ValidationIssue::SocUnknownType {
                id: id.to_string(),
                kind: kind.to_string(),
            }),
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Effect, SelectOption, TerminalResult};
    use pretty_assertions::assert_eq;

    fn terminal(level: i32) -> Option<TerminalResult> {
        Some(TerminalResult {
            base_level: Some(level),
            description: format!("Level {level}"),
        })
    }

    fn simple_tree() -> Vec<DecisionNode> {
        vec![DecisionNode {
            id: "base_1".into(),
            text: "Did the offense involve a machine gun?".into(),
            kind: Some("yesno".into()),
            yes_result: terminal(24),
            no_result: terminal(10),
            ..Default::default()
        }]
    }

    #[test]
    fn test_valid_tree_has_no_issues() {
        assert_eq!(validate_tree(&simple_tree()), vec![]);
    }

    #[test]
    fn test_removing_root_yields_only_missing_root() {
        assert_eq!(validate_tree(&[]), vec![ValidationIssue::MissingRoot]);

        let mut renamed = simple_tree();
        renamed[0].id = "base_0".into();
        assert_eq!(validate_tree(&renamed), vec![ValidationIssue::MissingRoot]);
    }

    #[test]
    fn test_missing_outcome() {
        let tree = vec![DecisionNode {
            id: "base_1".into(),
            yes_result: terminal(20),
            ..Default::default()
        }];
        assert_eq!(
            validate_tree(&tree),
            vec![ValidationIssue::MissingOutcome {
                node: "base_1".into(),
                branch: Branch::No,
            }]
        );
    }

    #[test]
    fn test_ambiguous_outcome() {
        let tree = vec![
            DecisionNode {
                id: "base_1".into(),
                yes_next: Some("base_2".into()),
                yes_result: terminal(20),
                no_result: terminal(12),
                ..Default::default()
            },
            DecisionNode {
                id: "base_2".into(),
                yes_result: terminal(22),
                no_result: terminal(14),
                ..Default::default()
            },
        ];
        assert_eq!(
            validate_tree(&tree),
            vec![ValidationIssue::AmbiguousOutcome {
                node: "base_1".into(),
                branch: Branch::Yes,
            }]
        );
    }

    #[test]
    fn test_dangling_reference() {
        let tree = vec![DecisionNode {
            id: "base_1".into(),
            yes_next: Some("base_9".into()),
            no_result: terminal(6),
            ..Default::default()
        }];
        let issues = validate_tree(&tree);
        assert_eq!(
            issues,
            vec![ValidationIssue::DanglingReference {
                node: "base_1".into(),
                branch: Branch::Yes,
                target: "base_9".into(),
            }]
        );
        assert_eq!(
            issues[0].to_string(),
            "base_1.yesNext references non-existent 'base_9'"
        );
    }

    #[test]
    fn test_unreachable_nodes_reported_individually() {
        let tree = vec![
            DecisionNode {
                id: "base_1".into(),
                yes_next: Some("base_2".into()),
                no_result: terminal(12),
                ..Default::default()
            },
            DecisionNode {
                id: "base_2".into(),
                yes_result: terminal(20),
                no_result: terminal(14),
                ..Default::default()
            },
            DecisionNode {
                id: "orphan_a".into(),
                yes_next: Some("orphan_b".into()),
                no_result: terminal(6),
                ..Default::default()
            },
            DecisionNode {
                id: "orphan_b".into(),
                yes_result: terminal(8),
                no_result: terminal(6),
                ..Default::default()
            },
        ];
        assert_eq!(
            validate_tree(&tree),
            vec![
                ValidationIssue::Unreachable {
                    node: "orphan_a".into()
                },
                ValidationIssue::Unreachable {
                    node: "orphan_b".into()
                },
            ]
        );
    }

    #[test]
    fn test_cycles_terminate() {
        let tree = vec![
            DecisionNode {
                id: "base_1".into(),
                yes_next: Some("base_2".into()),
                no_result: terminal(12),
                ..Default::default()
            },
            DecisionNode {
                id: "base_2".into(),
                yes_next: Some("base_1".into()),
                no_result: terminal(14),
                ..Default::default()
            },
        ];
        assert_eq!(validate_tree(&tree), vec![]);
    }

    #[test]
    fn test_missing_and_duplicate_ids() {
        let mut tree = simple_tree();
        tree.push(simple_tree().remove(0));
        tree.push(DecisionNode::default());
        assert_eq!(
            validate_tree(&tree),
            vec![
                ValidationIssue::DuplicateNodeId {
                    id: "base_1".into()
                },
                ValidationIssue::MissingNodeId { index: 2 },
            ]
        );
    }

    #[test]
    fn test_duplicate_ids_walk_every_copy() {
        let tree = vec![
            DecisionNode {
                id: "base_1".into(),
                yes_next: Some("base_2".into()),
                no_result: terminal(6),
                ..Default::default()
            },
            DecisionNode {
                id: "base_2".into(),
                yes_result: terminal(20),
                no_result: terminal(14),
                ..Default::default()
            },
            DecisionNode {
                id: "base_1".into(),
                yes_result: terminal(12),
                no_result: terminal(8),
                ..Default::default()
            },
        ];
        assert_eq!(
            validate_tree(&tree),
            vec![ValidationIssue::DuplicateNodeId {
                id: "base_1".into()
            }]
        );
    }

    #[test]
    fn test_terminal_without_base_level() {
        let tree = vec![DecisionNode {
            id: "base_1".into(),
            yes_result: Some(TerminalResult {
                base_level: None,
                description: "Unclear".into(),
            }),
            no_result: terminal(10),
            ..Default::default()
        }];
        let issues = validate_tree(&tree);
        assert_eq!(
            issues,
            vec![ValidationIssue::MissingBaseLevel {
                node: "base_1".into(),
                branch: Branch::Yes,
            }]
        );
        assert_eq!(issues[0].to_string(), "base_1.yesResult missing baseLevel");
    }

    #[test]
    fn test_select_option_without_label() {
        let json = serde_json::json!([{
            "id": "soc_count",
            "type": "select",
            "options": [{ "label": "1-2", "adjustment": 0 }, { "adjustment": 2 }]
        }]);
        let socs: Vec<SpecificOffenseCharacteristic> = serde_json::from_value(json).unwrap();
        let messages: Vec<String> = validate_socs(&socs).iter().map(ToString::to_string).collect();
        assert_eq!(messages, vec!["soc_count option #1 missing label"]);
    }

    #[test]
    fn test_soc_checks() {
        let socs = vec![
            SpecificOffenseCharacteristic {
                id: Some("soc_firearms".into()),
                kind: Some("select".into()),
                options: Some(vec![SelectOption {
                    label: "3-7 firearms".into(),
                    adjustment: 2,
                }]),
                ..Default::default()
            },
            SpecificOffenseCharacteristic {
                id: Some("soc_stolen".into()),
                kind: Some("yesno".into()),
                yes_effect: Some(Effect {
                    adjustment: Some(2),
                    ..Default::default()
                }),
                ..Default::default()
            },
            SpecificOffenseCharacteristic {
                id: Some("soc_empty".into()),
                kind: Some("select".into()),
                options: Some(vec![]),
                ..Default::default()
            },
            SpecificOffenseCharacteristic {
                kind: Some("yesno".into()),
                ..Default::default()
            },
            SpecificOffenseCharacteristic {
                id: Some("soc_untyped".into()),
                ..Default::default()
            },
            SpecificOffenseCharacteristic {
                id: Some("soc_range".into()),
                kind: Some("range".into()),
                ..Default::default()
            },
        ];

        let messages: Vec<String> = validate_socs(&socs).iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "soc_stolen (yesno) missing noEffect",
                "soc_empty (select) missing options",
                "SOC #3 missing 'id' field",
                "soc_untyped missing 'type' field",
                "soc_range has unknown type 'range'",
            ]
        );
    }

    #[test]
    fn test_validate_rules_combines() {
        let rules = SectionRules {
            title: "Unlawful Receipt".into(),
            section: "2K2.1".into(),
            pdf_reference: "Guidelines/2025/GLMFull 1.pdf".into(),
            base_offense_questions: vec![],
            specific_offense_characteristics: vec![SpecificOffenseCharacteristic::default()],
        };
        assert_eq!(
            validate_rules(&rules),
            vec![
                ValidationIssue::MissingRoot,
                ValidationIssue::SocMissingId { index: 0 },
            ]
        );
    }
}
