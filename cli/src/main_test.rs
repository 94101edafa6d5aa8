use super::*;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("portal-cli").chain(args.iter().copied())).expect("valid args")
}

// =============================================================================
// argument parsing
// =============================================================================

#[test]
fn login_takes_email_and_password() {
    let cli = parse(&["login", "--email", "admin@school.test", "--password", "secret123"]);
    match cli.command {
        Command::Login { email, password } => {
            assert_eq!(email, "admin@school.test");
            assert_eq!(password, "secret123");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn members_accepts_each_directory() {
    for (raw, expected) in
        [("students", Directory::Students), ("teachers", Directory::Teachers), ("accounts", Directory::Accounts)]
    {
        match parse(&["members", raw]).command {
            Command::Members { directory } => assert_eq!(Directory::from(directory), expected),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

#[test]
fn structure_rejects_unknown_kind() {
    assert!(Cli::try_parse_from(["portal-cli", "structure", "houses"]).is_err());
}

#[test]
fn structure_maps_to_portal_kind() {
    match parse(&["structure", "levels"]).command {
        Command::Structure { kind } => assert_eq!(Structure::from(kind), Structure::Levels),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn messages_send_requires_thread_and_body() {
    assert!(Cli::try_parse_from(["portal-cli", "messages", "send", "--thread", "t1"]).is_err());
    match parse(&["messages", "send", "--thread", "t1", "--body", "hello"]).command {
        Command::Messages(MessagesCommand { command: MessagesSubcommand::Send { thread, body } }) => {
            assert_eq!(thread, "t1");
            assert_eq!(body, "hello");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn global_options_precede_the_command() {
    let cli = parse(&["--base-url", "http://localhost:4000/api", "--token-file", "/tmp/tok", "whoami"]);
    assert_eq!(cli.base_url.as_deref(), Some("http://localhost:4000/api"));
    assert_eq!(cli.token_file, Some(PathBuf::from("/tmp/tok")));
    assert!(matches!(cli.command, Command::Whoami));
}

// =============================================================================
// portal construction
// =============================================================================

#[test]
fn build_portal_applies_base_url_override() {
    let cli = parse(&["--base-url", "http://localhost:4000/api/", "--token-file", "/tmp/portal-cli-test", "logout"]);
    let portal = build_portal(&cli).expect("portal");
    assert_eq!(portal.config().api_base_url, "http://localhost:4000/api");
    assert_eq!(portal.session().storage().path(), std::path::Path::new("/tmp/portal-cli-test"));
}

#[test]
fn build_portal_rejects_non_http_base_url() {
    let cli = parse(&["--base-url", "ftp://school", "logout"]);
    assert!(matches!(build_portal(&cli), Err(CliError::Config(_))));
}

#[test]
fn describe_identity_shows_name_email_and_role() {
    let user: Identity = serde_json::from_value(serde_json::json!({
        "_id": "u1",
        "role": "teacher",
        "firstName": "Ada",
        "lastName": "Obi",
        "email": "ada@school.test"
    }))
    .expect("identity");
    assert_eq!(describe_identity(&user), "Ada Obi <ada@school.test> (teacher)");
}
