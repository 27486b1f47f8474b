mod common;

use common::{FakeGateway, cron_fields};
use cpanel_api::{Gateway, RemoteKey, ResourceKind};
use cpanel_reconcile::membership::{diff, reconcile_membership};
use cpanel_reconcile::{
    Action, CronJobSpec, CronJobs, DatabaseSpec, Databases, ErrorCategory, MembershipSet,
    Reconciler, UserSpec, Users,
};

fn job(minute: &str, command: &str) -> CronJobSpec {
    CronJobSpec {
        minute: minute.into(),
        hour: "0".into(),
        day: "1".into(),
        weekday: "*".into(),
        month: "1".into(),
        command: command.into(),
    }
}

#[tokio::test]
async fn cron_job_is_found_after_its_line_key_changes() {
    let fake = FakeGateway::new();
    fake.seed_cron(cron_fields("30", "backup.sh"));
    let jobs = Reconciler::new(fake.shared(), CronJobs);
    let desired = job("0", "ls -la");

    let outcome = jobs.converge(Some(&desired), None).await.unwrap();
    assert_eq!(outcome.action, Action::Create);
    assert_eq!(outcome.identity.as_str(), "accf27d94a460f65d94fd41b0acbe665");
    let applied = outcome.applied.unwrap();
    assert_eq!(applied.key, Some(RemoteKey::Line(2)));

    // Removing the first line renumbers ours from 2 to 1.
    fake.delete_one(ResourceKind::CronJob, &RemoteKey::Line(1))
        .await
        .unwrap();

    let observed = jobs.read(&desired).await.unwrap().expect("job still present");
    assert_eq!(observed.key, Some(RemoteKey::Line(1)));
    assert_eq!(observed.field("command"), "ls -la");
}

#[tokio::test]
async fn cron_job_update_edits_the_freshly_observed_line() {
    let fake = FakeGateway::new();
    fake.seed_cron(cron_fields("30", "backup.sh"));
    fake.seed_cron(cron_fields("0", "ls -la"));
    let jobs = Reconciler::new(fake.shared(), CronJobs);

    let prior = job("0", "ls -la");
    let desired = job("15", "ls -la");
    let outcome = jobs.converge(Some(&desired), Some(&prior)).await.unwrap();

    assert_eq!(outcome.action, Action::Update { rename: false });
    assert_eq!(fake.mutations(), ["update_one cron_job 2"]);
    assert_eq!(fake.cron_lines()[1], cron_fields("15", "ls -la"));
}

#[tokio::test]
async fn cron_job_drift_recreates_the_line() {
    let fake = FakeGateway::new();
    let jobs = Reconciler::new(fake.shared(), CronJobs);
    let spec = job("0", "ls -la");

    let outcome = jobs.converge(Some(&spec), Some(&spec)).await.unwrap();

    assert_eq!(outcome.action, Action::Create);
    assert_eq!(fake.cron_lines().len(), 1);
}

#[tokio::test]
async fn converging_twice_issues_no_second_mutation() {
    let fake = FakeGateway::new();
    let gateway = fake.shared();
    let jobs = Reconciler::new(gateway.clone(), CronJobs);
    let users = Reconciler::new(gateway.clone(), Users);
    let databases = Reconciler::new(gateway, Databases);

    let job_spec = job("0", "ls -la");
    let alice = UserSpec::new("alice", "pw");
    let bob = UserSpec::new("bob", "pw");
    let db = DatabaseSpec::new("app_db").with_users(["alice", "bob"]);

    let job_state = jobs.converge(Some(&job_spec), None).await.unwrap().applied;
    let alice_state = users.converge(Some(&alice), None).await.unwrap().applied;
    let bob_state = users.converge(Some(&bob), None).await.unwrap().applied;
    let db_state = databases.converge(Some(&db), None).await.unwrap().applied;
    assert!(!fake.mutations().is_empty());

    fake.clear_calls();
    let second = [
        jobs.converge(Some(&job_spec), job_state.as_ref().map(|a| &a.spec))
            .await
            .unwrap()
            .action,
        users
            .converge(Some(&alice), alice_state.as_ref().map(|a| &a.spec))
            .await
            .unwrap()
            .action,
        users
            .converge(Some(&bob), bob_state.as_ref().map(|a| &a.spec))
            .await
            .unwrap()
            .action,
        databases
            .converge(Some(&db), db_state.as_ref().map(|a| &a.spec))
            .await
            .unwrap()
            .action,
    ];

    assert!(second.iter().all(|action| *action == Action::Noop));
    assert!(fake.mutations().is_empty(), "unexpected: {:?}", fake.mutations());
}

#[test]
fn membership_diff_splits_members() {
    let desired = MembershipSet::from_members("app_db", ["alice", "bob"]).unwrap();
    let observed = MembershipSet::observed("app_db", ["alice", "carol"]);

    let delta = diff(&desired, &observed);

    assert_eq!(delta.to_grant.members(), ["bob"]);
    assert_eq!(delta.to_revoke.members(), ["carol"]);
    assert!(delta.to_grant.iter().all(|g| g.owner == "app_db"));
}

#[tokio::test]
async fn rename_precedes_membership_changes() {
    let fake = FakeGateway::new();
    fake.seed_user("alice", "pw");
    fake.seed_user("bob", "pw");
    fake.seed_database("old_name", &["alice"]);
    let databases = Reconciler::new(fake.shared(), Databases);

    let prior = DatabaseSpec::new("old_name").with_users(["alice"]);
    let desired = DatabaseSpec::new("new_name").with_users(["bob"]);
    let outcome = databases
        .converge(Some(&desired), Some(&prior))
        .await
        .unwrap();

    assert_eq!(outcome.action, Action::Update { rename: true });
    assert_eq!(
        fake.mutations(),
        [
            "rename_one postgresql_database old_name new_name",
            "grant new_name bob",
            "revoke new_name alice",
        ]
    );
    assert_eq!(fake.database_members("new_name").unwrap(), ["bob"]);
    assert!(fake.database_members("old_name").is_none());
}

#[tokio::test]
async fn missing_member_fails_before_any_grant() {
    let fake = FakeGateway::new();
    fake.seed_user("alice", "pw");
    fake.seed_database("app_db", &["alice"]);
    let databases = Reconciler::new(fake.shared(), Databases);

    let desired = DatabaseSpec::new("app_db").with_users(["alice", "dave"]);
    let err = databases
        .converge(Some(&desired), Some(&DatabaseSpec::new("app_db").with_users(["alice"])))
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Validation);
    assert!(err.message().contains("dave"));
    assert!(fake.mutations().is_empty());
}

#[tokio::test]
async fn duplicate_members_fail_before_any_remote_call() {
    let fake = FakeGateway::new();
    let databases = Reconciler::new(fake.shared(), Databases);

    let desired = DatabaseSpec::new("app_db").with_users(["alice", "alice"]);
    let err = databases.converge(Some(&desired), None).await.unwrap_err();

    assert!(err.is_validation());
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn grants_run_before_revokes_and_stop_on_failure() {
    let fake = FakeGateway::new();
    for user in ["alice", "bob", "carol", "dan"] {
        fake.seed_user(user, "pw");
    }
    fake.seed_database("app_db", &["carol", "dan"]);
    fake.reject("grant", "privilege error");

    let desired = MembershipSet::from_members("app_db", ["alice", "bob"]).unwrap();
    let observed = MembershipSet::observed("app_db", ["carol", "dan"]);
    let err = reconcile_membership(fake.as_ref(), "app_db", &desired, &observed)
        .await
        .unwrap_err();

    assert!(err.is_rejection());
    assert_eq!(err.message(), "privilege error");
    // First grant failed: nothing else was attempted.
    assert_eq!(fake.mutations(), ["grant app_db alice"]);

    fake.clear_calls();
    reconcile_membership(fake.as_ref(), "app_db", &desired, &observed)
        .await
        .unwrap();
    assert_eq!(
        fake.mutations(),
        [
            "grant app_db alice",
            "grant app_db bob",
            "revoke app_db carol",
            "revoke app_db dan",
        ]
    );
}

#[tokio::test]
async fn failed_revoke_stops_the_remaining_revokes() {
    let fake = FakeGateway::new();
    for user in ["alice", "bob", "carol", "dan"] {
        fake.seed_user(user, "pw");
    }
    fake.seed_database("app_db", &["carol", "dan"]);
    fake.reject("revoke", "revoke failed");

    let desired = MembershipSet::from_members("app_db", ["alice", "bob"]).unwrap();
    let observed = MembershipSet::observed("app_db", ["carol", "dan"]);
    let err = reconcile_membership(fake.as_ref(), "app_db", &desired, &observed)
        .await
        .unwrap_err();

    assert!(err.is_rejection());
    assert_eq!(err.message(), "revoke failed");
    assert_eq!(
        fake.mutations(),
        [
            "grant app_db alice",
            "grant app_db bob",
            "revoke app_db carol",
        ]
    );
    assert_eq!(fake.database_members("app_db").unwrap(), ["carol", "dan", "alice", "bob"]);
}

#[tokio::test]
async fn missing_member_on_create_leaves_an_empty_database_to_adopt() {
    let fake = FakeGateway::new();
    fake.seed_user("alice", "pw");
    let databases = Reconciler::new(fake.shared(), Databases);
    let desired = DatabaseSpec::new("app_db").with_users(["alice", "dave"]);

    let err = databases.converge(Some(&desired), None).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert!(err.message().contains("dave"));
    assert_eq!(fake.mutations(), ["create_one postgresql_database app_db"]);
    assert_eq!(fake.database_members("app_db").unwrap(), Vec::<String>::new());

    fake.seed_user("dave", "pw");
    fake.clear_calls();
    let outcome = databases.converge(Some(&desired), None).await.unwrap();

    assert_eq!(outcome.action, Action::Update { rename: false });
    assert_eq!(fake.mutations(), ["grant app_db alice", "grant app_db dave"]);
}

#[tokio::test]
async fn remote_rejection_surfaces_verbatim() {
    let fake = FakeGateway::new();
    fake.reject("create_one", "quota exceeded");
    let databases = Reconciler::new(fake.shared(), Databases);

    let err = databases
        .converge(Some(&DatabaseSpec::new("app_db")), None)
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Rejected);
    assert_eq!(err.message(), "quota exceeded");
    assert_eq!(err.identity().as_str(), "app_db");
}

#[tokio::test]
async fn user_rename_carries_the_password() {
    let fake = FakeGateway::new();
    fake.seed_user("alice", "old");
    let users = Reconciler::new(fake.shared(), Users);

    let prior = UserSpec::new("alice", "old");
    let desired = UserSpec::new("alicia", "new");
    let outcome = users.converge(Some(&desired), Some(&prior)).await.unwrap();

    assert_eq!(outcome.action, Action::Update { rename: true });
    assert_eq!(fake.mutations(), ["rename_one postgresql_user alice alicia"]);
    assert_eq!(fake.password_of("alicia").as_deref(), Some("new"));
}

#[tokio::test]
async fn user_password_change_sets_password_in_place() {
    let fake = FakeGateway::new();
    fake.seed_user("alice", "old");
    let users = Reconciler::new(fake.shared(), Users);

    let outcome = users
        .converge(
            Some(&UserSpec::new("alice", "new")),
            Some(&UserSpec::new("alice", "old")),
        )
        .await
        .unwrap();

    assert_eq!(outcome.action, Action::Update { rename: false });
    assert_eq!(fake.mutations(), ["update_one postgresql_user alice"]);
    assert_eq!(fake.password_of("alice").as_deref(), Some("new"));
}

#[tokio::test]
async fn removal_deletes_only_when_present() {
    let fake = FakeGateway::new();
    fake.seed_database("app_db", &[]);
    let databases = Reconciler::new(fake.shared(), Databases);
    let prior = DatabaseSpec::new("app_db");

    let outcome = databases.converge(None, Some(&prior)).await.unwrap();
    assert_eq!(outcome.action, Action::Delete);
    assert!(outcome.applied.is_none());

    fake.clear_calls();
    let outcome = databases.converge(None, Some(&prior)).await.unwrap();
    assert_eq!(outcome.action, Action::Noop);
    assert!(fake.mutations().is_empty());
}

#[tokio::test]
async fn explicit_delete_reports_whether_anything_was_removed() {
    let fake = FakeGateway::new();
    fake.seed_user("alice", "pw");
    let users = Reconciler::new(fake.shared(), Users);
    let prior = UserSpec::new("alice", "pw");

    assert!(users.delete(&prior).await.unwrap());
    assert_eq!(fake.mutations(), ["delete_one postgresql_user alice"]);

    fake.clear_calls();
    assert!(!users.delete(&prior).await.unwrap());
    assert!(fake.mutations().is_empty());
}

#[tokio::test]
async fn plan_never_mutates() {
    let fake = FakeGateway::new();
    fake.seed_user("alice", "pw");
    let users = Reconciler::new(fake.shared(), Users);

    let plan = users
        .plan(Some(&UserSpec::new("bob", "pw")), None)
        .await
        .unwrap();
    assert_eq!(plan.action, Action::Create);
    assert!(plan.observed.is_none());

    let plan = users.plan(None, Some(&UserSpec::new("alice", "pw"))).await.unwrap();
    assert_eq!(plan.action, Action::Delete);
    assert!(fake.mutations().is_empty());
}
