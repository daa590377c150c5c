// self
use broker_credential::{
	_preludet::*,
	auth::{AllowedTenants, ClientId, ScopeList, TenantId, TokenResult},
	client::Prompt,
	config::{CredentialConfig, WindowHandle},
	flows::{BrokerCredential, ChainContext, TokenRequestOptions},
	registry::CapabilityMode,
};

fn graph_scopes() -> ScopeList {
	ScopeList::new(["https://graph.example/.default"])
		.expect("Graph scope fixture should be valid.")
}

fn broker_config() -> CredentialConfig {
	CredentialConfig::builder(ClientId::new("client-it").expect("Client fixture should be valid."))
		.tenant_id(TenantId::new("contoso").expect("Tenant fixture should be valid."))
		.additionally_allowed_tenants(AllowedTenants::any())
		.login_hint("user@contoso.example")
		.redirect_uri("http://localhost:8400")
		.parent_window_handle(WindowHandle(42))
		.enable_msa_passthrough(true)
		.use_operating_system_account(true)
		.timeout_secs(60)
		.build()
		.expect("Broker configuration fixture should build.")
}

#[tokio::test]
async fn socket_failure_on_os_account_falls_back_to_interactive() {
	let (credential, factory, _) = build_test_credential(broker_config());

	factory.push_script(vec![MockReply::SocketError, MockReply::token("interactive-token")]);

	let result = credential
		.request_token(&graph_scopes(), &TokenRequestOptions::default().with_claims("{\"cp1\":1}"))
		.await
		.expect("Interactive fallback should produce a token.");
	let built = factory.built();
	let requests = built[0].requests();

	assert_eq!(result.access_token.as_ref().map(|secret| secret.expose()), Some("interactive-token"));
	assert_eq!(requests.len(), 2);

	for (request, prompt) in requests.iter().zip([Prompt::None, Prompt::SelectAccount]) {
		assert_eq!(request.prompt, prompt);
		assert_eq!(request.port, Some(8400));
		assert_eq!(request.login_hint.as_deref(), Some("user@contoso.example"));
		assert_eq!(request.claims_challenge.as_deref(), Some("{\"cp1\":1}"));
		assert_eq!(request.parent_window_handle, Some(WindowHandle(42)));
		assert_eq!(request.timeout, Duration::seconds(60));
		assert!(request.enable_msa_passthrough);
	}
}

#[tokio::test]
async fn error_result_description_surfaces_outside_chains() {
	let (credential, factory, _) = build_test_credential(test_config());

	factory.push_script(vec![MockReply::error(
		"invalid_client",
		"AADSTS7000218: The request body must contain client_assertion.",
	)]);

	let err = credential
		.request_token(&graph_scopes(), &TokenRequestOptions::default())
		.await
		.expect_err("Error results must fail standalone calls.");

	match err {
		Error::AuthenticationFailed { message, error } => {
			assert_eq!(message, "AADSTS7000218: The request body must contain client_assertion.");
			assert_eq!(error.as_deref(), Some("invalid_client"));
		},
		other => panic!("Expected AuthenticationFailed, got {other:?}."),
	}
}

#[tokio::test]
async fn chained_calls_downgrade_token_less_results() {
	let (credential, factory, _) = build_test_credential(test_config());

	factory.push_script(vec![MockReply::error("access_denied", "User cancelled the flow.")]);

	let err = credential
		.request_token(
			&graph_scopes(),
			&TokenRequestOptions::default().with_chain_context(ChainContext::Chained),
		)
		.await
		.expect_err("Token-less results must fail.");

	assert!(err.is_unavailable());
	assert_eq!(err.to_string(), "User cancelled the flow.");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_calls_share_one_application() {
	let (credential, factory, caches) = build_test_credential(test_config());
	let credential = Arc::new(credential);

	factory.push_script((0..8).map(|idx| MockReply::token(&format!("token-{idx}"))).collect());

	let tasks = (0..8)
		.map(|_| {
			let credential = credential.clone();

			tokio::spawn(async move {
				credential.request_token(&graph_scopes(), &TokenRequestOptions::default()).await
			})
		})
		.collect::<Vec<_>>();

	for task in tasks {
		let result: TokenResult = task
			.await
			.expect("Acquisition task should not panic.")
			.expect("Concurrent acquisitions should succeed.");

		assert!(result.is_success());
	}

	assert_eq!(factory.built().len(), 1);
	assert_eq!(factory.built()[0].call_count(), 8);
	assert_eq!(caches.count(CapabilityMode::Standard), 1);
}

#[tokio::test]
async fn each_tenant_and_mode_gets_its_own_application() {
	let (credential, factory, caches) = build_test_credential(broker_config());
	let fabrikam = TenantId::new("fabrikam").expect("Tenant fixture should be valid.");
	let requests = [
		TokenRequestOptions::default(),
		TokenRequestOptions::default().with_tenant(fabrikam.clone()),
		TokenRequestOptions::default().with_cae(true),
		TokenRequestOptions::default().with_tenant(fabrikam).with_cae(true),
		TokenRequestOptions::default(),
	];

	for _ in 0..4 {
		factory.push_script(vec![MockReply::token("a"), MockReply::token("b")]);
	}
	for options in &requests {
		credential
			.request_token(&graph_scopes(), options)
			.await
			.expect("Scripted acquisitions should succeed.");
	}

	let authorities = factory
		.built()
		.iter()
		.map(|app| (app.params.authority.clone(), app.params.capabilities.clone()))
		.collect::<Vec<_>>();

	assert_eq!(
		authorities,
		vec![
			("https://login.microsoftonline.com/contoso".to_owned(), None),
			("https://login.microsoftonline.com/fabrikam".to_owned(), None),
			("https://login.microsoftonline.com/contoso".to_owned(), Some(vec!["CP1".to_owned()])),
			("https://login.microsoftonline.com/fabrikam".to_owned(), Some(vec!["CP1".to_owned()])),
		]
	);
	assert_eq!(factory.built()[0].call_count(), 2);
	assert_eq!(caches.count(CapabilityMode::Standard), 1);
	assert_eq!(caches.count(CapabilityMode::ContinuousAccessEvaluation), 1);
}

#[tokio::test]
async fn construction_failures_are_not_classified() {
	let (credential, factory, _) = build_test_credential(test_config());

	factory.fail_construction("authority validation failed");

	let err = credential
		.request_token(
			&graph_scopes(),
			&TokenRequestOptions::default().with_chain_context(ChainContext::Chained),
		)
		.await
		.expect_err("Construction failures must propagate.");

	assert!(matches!(err, Error::ClientBuild { .. }));
	assert!(!err.is_unavailable());
}

#[test]
fn credential_is_shareable_across_threads() {
	fn assert_send_sync<T: Send + Sync>() {}

	assert_send_sync::<BrokerCredential>();
}
