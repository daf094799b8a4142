// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::{Arc, PoisonError};
use std::thread;

use phylodiff::actions::{register_builtins, ActionRegistry, BuiltinAction};
use phylodiff::diff::{pair_and_diff, DiffRequest, LeafSetDiff};
use phylodiff::dispatch::Side;
use phylodiff::model::{ActionId, NodeId, SessionDefaults, SessionId, TreeSource};
use phylodiff::{CompareService, LoadRequest};

const ROUNDS: usize = 20;

fn sid(value: &str) -> SessionId {
    SessionId::new(value).expect("session id")
}

fn load(id: &str, newick: &str) -> LoadRequest {
    LoadRequest { session_id: sid(id), source: TreeSource::new(newick) }
}

fn builtin(service: &CompareService, action: BuiltinAction) -> ActionId {
    service
        .defaults()
        .actions
        .list_actions()
        .into_iter()
        .find(|entry| entry.name() == action.display_name())
        .map(|entry| entry.action_id().clone())
        .expect("registered")
}

/// Every node has a record, every match points at a live partner node, and the pair is mutual.
fn assert_consistent_pair(service: &CompareService, left: &str, right: &str) {
    let a = service.store().get(&sid(left)).expect("left");
    let b = service.store().get(&sid(right)).expect("right");
    let (a_partner, a_targets, a_len, a_records) = {
        let a = a.lock().unwrap_or_else(PoisonError::into_inner);
        let targets = a.correlation().iter().filter_map(|(_, r)| r.target_node_id()).collect::<Vec<_>>();
        (a.partner().cloned(), targets, a.tree().len(), a.correlation().len())
    };
    let b = b.lock().unwrap_or_else(PoisonError::into_inner);

    assert_eq!(a_partner, Some(sid(right)));
    assert_eq!(b.partner(), Some(&sid(left)));
    assert_eq!(a_records, a_len);
    assert_eq!(b.correlation().len(), b.tree().len());
    for target in a_targets {
        assert!(b.tree().node(target).is_some(), "{left} points at missing {right} node {target:?}");
    }
}

#[test]
fn concurrent_actions_draws_loads_and_rediffs_leave_sessions_consistent() {
    let registry = Arc::new(ActionRegistry::new());
    register_builtins(&registry, &BuiltinAction::ALL);
    let service = CompareService::new(SessionDefaults::new(registry));
    service.load_pair(&load("s1", "(A,(B,C));"), &load("s2", "(A,(B,D));"), None).expect("load");

    let toggle = builtin(&service, BuiltinAction::ToggleHighlight);
    let change_style = builtin(&service, BuiltinAction::ChangeStyle);
    let s1 = service.store().get(&sid("s1")).expect("s1");
    let s2 = service.store().get(&sid("s2")).expect("s2");

    thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..ROUNDS {
                service.run_action(&sid("s1"), NodeId::new(1), &toggle, Side::Source).expect("toggle");
                service.run_action(&sid("s2"), NodeId::new(2), &change_style, Side::Target).expect("style");
            }
        });
        scope.spawn(|| {
            for _ in 0..ROUNDS {
                assert!(service.draw(&sid("s1")).expect("draw s1").contains(r#"<MAP NAME="map_s1""#));
                assert!(service.draw(&sid("s2")).expect("draw s2").contains(r#"<MAP NAME="map_s2""#));
            }
        });
        scope.spawn(|| {
            for round in 0..ROUNDS {
                let (x, y) = (format!("x{round}"), format!("y{round}"));
                service
                    .load_pair(&load(&x, "((A,B),(C,D));"), &load(&y, "((A,C),(B,D));"), None)
                    .expect("load");
            }
        });
        scope.spawn(|| {
            for _ in 0..ROUNDS {
                pair_and_diff(&LeafSetDiff, &s1, &s2, &DiffRequest::default());
            }
        });
    });

    assert_consistent_pair(&service, "s1", "s2");
    assert_consistent_pair(&service, "s2", "s1");
    for round in 0..ROUNDS {
        assert_consistent_pair(&service, &format!("x{round}"), &format!("y{round}"));
    }
    assert_eq!(service.store().len(), 2 + 2 * ROUNDS);

    // An even number of toggles cancels out.
    let s1 = s1.lock().unwrap_or_else(PoisonError::into_inner);
    assert!(!s1.find_node(NodeId::new(1)).expect("A").style().highlighted());
}
