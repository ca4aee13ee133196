//! Project lifecycle FSM tests

use xistra::deploy::fsm::{ProjectEvent, ProjectFsm};
use xistra::models::project::ProjectStatus;

#[test]
fn test_fsm_initial_state() {
    let fsm = ProjectFsm::default();
    assert_eq!(fsm.state(), ProjectStatus::Pending);
    assert!(fsm.error().is_none());
}

#[test]
fn test_fsm_deploy_success_flow() {
    let mut fsm = ProjectFsm::default();

    // Pending -> Building
    assert_eq!(fsm.process(ProjectEvent::Build).unwrap(), ProjectStatus::Building);

    // Building -> Deployed
    assert_eq!(fsm.process(ProjectEvent::Succeeded).unwrap(), ProjectStatus::Deployed);

    // Deployed -> Stopped
    assert_eq!(fsm.process(ProjectEvent::Stop).unwrap(), ProjectStatus::Stopped);

    // Stopped -> Building (redeploy)
    assert_eq!(fsm.process(ProjectEvent::Build).unwrap(), ProjectStatus::Building);
}

#[test]
fn test_fsm_failure_records_error() {
    let mut fsm = ProjectFsm::default();
    fsm.process(ProjectEvent::Build).unwrap();
    fsm.process(ProjectEvent::Failed("no strategy worked".to_string()))
        .unwrap();

    assert_eq!(fsm.state(), ProjectStatus::Failed);
    assert_eq!(fsm.error(), Some("no strategy worked"));

    // A retry clears the error
    fsm.process(ProjectEvent::Build).unwrap();
    assert!(fsm.error().is_none());
}

#[test]
fn test_fsm_invalid_transitions() {
    let mut fsm = ProjectFsm::default();
    assert!(fsm.process(ProjectEvent::Stop).is_err());
    assert!(fsm.process(ProjectEvent::Succeeded).is_err());
    assert_eq!(fsm.state(), ProjectStatus::Pending);

    let mut building = ProjectFsm::new(ProjectStatus::Building);
    assert!(building.process(ProjectEvent::Build).is_err());

    let mut failed = ProjectFsm::new(ProjectStatus::Failed);
    assert!(failed.process(ProjectEvent::Stop).is_err());
}
