//! End-to-end scheduling scenarios.
//!
//! Drives the scheduler through the host-visible operations and checks
//! result codes, query output and the no-partial-commit guarantee.

use taskgrid_scheduler::*;
use taskgrid_state::{TaskInfo, UNASSIGNED_NODE};

fn scheduler_with(nodes: &[i32], tasks: &[(i32, i32)]) -> TaskScheduler {
    let mut scheduler = TaskScheduler::new();
    for &n in nodes {
        scheduler.register_node(n).unwrap();
    }
    for &(t, w) in tasks {
        scheduler.add_task(t, w).unwrap();
    }
    scheduler
}

fn query(scheduler: &TaskScheduler) -> Vec<TaskInfo> {
    let mut out = Vec::new();
    scheduler.query_task_status(&mut out).unwrap();
    out
}

fn schedule_code(scheduler: &mut TaskScheduler, threshold: i32) -> ReturnCode {
    ReturnCode::of(Operation::Schedule, &scheduler.schedule_tasks(threshold))
}

#[test]
fn non_positive_node_ids_are_invalid_without_state_change() {
    let mut scheduler = scheduler_with(&[1], &[]);
    for id in [0, -1, -42, i32::MIN] {
        let r = scheduler.register_node(id);
        assert_eq!(ReturnCode::of(Operation::RegisterNode, &r), ReturnCode::InvalidNodeId);
        let r = scheduler.unregister_node(id);
        assert_eq!(ReturnCode::of(Operation::UnregisterNode, &r), ReturnCode::InvalidNodeId);
    }
    assert_eq!(scheduler.store().nodes().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn duplicate_registration_keeps_node_count() {
    let mut scheduler = scheduler_with(&[3], &[]);
    let r = scheduler.register_node(3);
    assert_eq!(
        ReturnCode::of(Operation::RegisterNode, &r),
        ReturnCode::NodeAlreadyRegistered
    );
    assert_eq!(scheduler.store().node_count(), 1);
}

#[test]
fn unregistering_moves_exactly_its_tasks_back_to_pending() {
    let mut scheduler = scheduler_with(&[1, 2, 3], &[(10, 4), (20, 4), (30, 4), (40, 1)]);
    assert_eq!(schedule_code(&mut scheduler, 4), ReturnCode::ScheduleSucceeded);
    assert_eq!(
        query(&scheduler),
        vec![
            TaskInfo::new(10, 1),
            TaskInfo::new(20, 2),
            TaskInfo::new(30, 3),
            TaskInfo::new(40, 1),
        ]
    );

    let released = scheduler.unregister_node(1).unwrap();
    assert_eq!(released, vec![10, 40]);
    assert_eq!(
        query(&scheduler),
        vec![
            TaskInfo::new(10, UNASSIGNED_NODE),
            TaskInfo::new(20, 2),
            TaskInfo::new(30, 3),
            TaskInfo::new(40, UNASSIGNED_NODE),
        ]
    );
}

#[test]
fn released_tasks_are_rescheduled_like_new_ones() {
    let mut scheduler = scheduler_with(&[1, 2], &[(10, 5), (20, 5)]);
    scheduler.schedule_tasks(5).unwrap();
    scheduler.unregister_node(2).unwrap();
    scheduler.register_node(3).unwrap();

    assert_eq!(schedule_code(&mut scheduler, 5), ReturnCode::ScheduleSucceeded);
    assert_eq!(
        query(&scheduler),
        vec![TaskInfo::new(10, 1), TaskInfo::new(20, 3)]
    );
}

#[test]
fn schedule_without_pending_tasks_is_infeasible_for_any_threshold() {
    let mut scheduler = scheduler_with(&[1, 2], &[]);
    for threshold in [0, -5, 1, 5, 1_000, i32::MAX, i32::MIN] {
        assert_eq!(
            scheduler.schedule_tasks(threshold),
            Err(SchedulerError::NoPendingTasks)
        );
        assert_eq!(schedule_code(&mut scheduler, threshold), ReturnCode::NoSuitableSchedule);
    }
}

#[test]
fn invalid_threshold_code() {
    let mut scheduler = scheduler_with(&[1], &[(10, 1)]);
    assert_eq!(schedule_code(&mut scheduler, 0), ReturnCode::InvalidThreshold);
}

#[test]
fn query_is_idempotent() {
    let mut scheduler = scheduler_with(&[1, 2], &[(10, 5), (20, 5), (30, 1)]);
    scheduler.schedule_tasks(5).unwrap();
    scheduler.add_task(5, 2).unwrap();
    assert_eq!(query(&scheduler), query(&scheduler));
}

#[test]
fn scheduling_is_deterministic() {
    let nodes = [4, 2, 9, 1];
    let tasks = [(1, 3), (2, 3), (3, 8), (4, 1), (5, 5), (6, 5), (7, 2)];

    let mut first = scheduler_with(&nodes, &tasks);
    let mut second = scheduler_with(&nodes, &tasks);
    let a = first.schedule_tasks(8).unwrap();
    let b = second.schedule_tasks(8).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.assignments(), b.assignments());
    assert_eq!(query(&first), query(&second));
}

#[test]
fn two_nodes_three_equal_tasks_threshold_five() {
    let mut scheduler = scheduler_with(&[1, 2], &[(10, 5), (20, 5), (30, 5)]);
    assert_eq!(schedule_code(&mut scheduler, 5), ReturnCode::ScheduleSucceeded);

    let status = query(&scheduler);
    assert!(status.iter().all(|t| !t.is_pending()));
    let loads = scheduler.store().loads();
    assert_eq!((loads[&1] - loads[&2]).abs(), 5);
    assert_eq!(
        status,
        vec![
            TaskInfo::new(10, 1),
            TaskInfo::new(20, 2),
            TaskInfo::new(30, 1),
        ]
    );
}

#[test]
fn single_node_always_balances() {
    let mut scheduler = scheduler_with(&[1], &[(10, 5)]);
    assert_eq!(schedule_code(&mut scheduler, 1), ReturnCode::ScheduleSucceeded);
    assert_eq!(query(&scheduler), vec![TaskInfo::new(10, 1)]);
}

#[test]
fn no_nodes_is_infeasible() {
    for threshold in [1, 10, i32::MAX] {
        let mut scheduler = scheduler_with(&[], &[(10, 5)]);
        assert_eq!(schedule_code(&mut scheduler, threshold), ReturnCode::NoSuitableSchedule);
        assert_eq!(query(&scheduler), vec![TaskInfo::new(10, UNASSIGNED_NODE)]);
    }
}

#[test]
fn lopsided_weights_are_infeasible_without_partial_commit() {
    let mut scheduler = scheduler_with(&[1, 2], &[(10, 100), (20, 1)]);
    let before = query(&scheduler);

    assert_eq!(schedule_code(&mut scheduler, 1), ReturnCode::NoSuitableSchedule);
    assert_eq!(query(&scheduler), before);
    assert_eq!(scheduler.store().pending().len(), 2);
}

#[test]
fn delete_task_codes() {
    let mut scheduler = scheduler_with(&[1], &[(10, 5)]);
    scheduler.schedule_tasks(1).unwrap();

    let r = scheduler.delete_task(0);
    assert_eq!(ReturnCode::of(Operation::DeleteTask, &r), ReturnCode::InvalidTaskId);
    let r = scheduler.delete_task(11);
    assert_eq!(ReturnCode::of(Operation::DeleteTask, &r), ReturnCode::TaskNotFound);
    let r = scheduler.delete_task(10);
    assert_eq!(ReturnCode::of(Operation::DeleteTask, &r), ReturnCode::TaskDeleted);
    assert!(query(&scheduler).is_empty());
}

#[test]
fn add_task_codes() {
    let mut scheduler = scheduler_with(&[], &[(10, 5)]);
    for (id, weight, expected) in [
        (0, 5, ReturnCode::InvalidTaskId),
        (11, 0, ReturnCode::InvalidTaskId),
        (11, -2, ReturnCode::InvalidTaskId),
        (10, 1, ReturnCode::TaskAlreadyExists),
        (11, 1, ReturnCode::TaskAdded),
    ] {
        let r = scheduler.add_task(id, weight);
        assert_eq!(ReturnCode::of(Operation::AddTask, &r), expected, "task {id}");
    }
}

#[test]
fn shared_handle_matches_owned_scheduler() {
    let shared = SharedScheduler::new();
    shared.register_node(1).unwrap();
    shared.register_node(2).unwrap();
    for (id, weight) in [(10, 5), (20, 5), (30, 5)] {
        shared.add_task(id, weight).unwrap();
    }
    shared.schedule_tasks(5).unwrap();

    let owned = {
        let mut s = scheduler_with(&[1, 2], &[(10, 5), (20, 5), (30, 5)]);
        s.schedule_tasks(5).unwrap();
        query(&s)
    };
    assert_eq!(shared.task_status(), owned);
}
