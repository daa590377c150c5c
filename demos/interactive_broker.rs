//! Demonstrates the broker credential with a stand-in client application: the operating system
//! account attempt finds no broker session, so the credential falls back to the interactive
//! attempt, which redeems a code at a mock token endpoint through the credential's shared HTTP
//! transport and stores the result in the token cache.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use broker_credential::{
	auth::{ClientId, ScopeList, TenantId},
	cache::CachedToken,
	client::{
		AcquireError, AcquireFuture, ClientApplication, ClientApplicationFactory,
		ClientApplicationParams, InteractiveRequest, Prompt,
	},
	config::CredentialConfig,
	error::{BoxError, TransportError},
	flows::{BrokerCredential, TokenRequestOptions},
	http::HttpRequest,
	registry::CapabilityMode,
};

struct DemoApplication {
	params: ClientApplicationParams,
	token_endpoint: Url,
}
impl ClientApplication for DemoApplication {
	fn acquire_token_interactive<'a>(
		&'a self,
		request: &'a InteractiveRequest,
	) -> AcquireFuture<'a> {
		Box::pin(async move {
			if request.prompt == Prompt::None {
				return Err(AcquireError::Transport(TransportError::Io(std::io::Error::new(
					std::io::ErrorKind::NotFound,
					"no broker session on this platform",
				))));
			}

			let scopes = request.scopes.joined();
			let response = self
				.params
				.http_client
				.send(HttpRequest::form(
					self.token_endpoint.clone(),
					[
						("grant_type", "authorization_code"),
						("client_id", self.params.client_id.as_ref()),
						("code", "demo-code"),
						("scope", scopes.as_str()),
					],
				))
				.await?;
			let result = response.token_result()?;

			if let Some(cached) = CachedToken::from_result(
				&self.params.authority,
				&self.params.client_id,
				&request.scopes,
				&result,
				time::OffsetDateTime::now_utc(),
			) {
				self.params.token_cache.save(cached).map_err(AcquireError::other)?;
			}

			Ok(result)
		})
	}
}

struct DemoFactory {
	token_endpoint: Url,
}
impl ClientApplicationFactory for DemoFactory {
	fn new_client_application(
		&self,
		params: ClientApplicationParams,
	) -> std::result::Result<Arc<dyn ClientApplication>, BoxError> {
		println!("Constructing client application for {}.", params.authority);

		Ok(Arc::new(DemoApplication { params, token_endpoint: self.token_endpoint.clone() }))
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/contoso/oauth2/v2.0/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let config = CredentialConfig::builder(ClientId::new("demo-client")?)
		.tenant_id(TenantId::new("contoso")?)
		.redirect_uri("http://localhost:8400")
		.use_operating_system_account(true)
		.build()?;
	let factory =
		Arc::new(DemoFactory { token_endpoint: Url::parse(&server.url("/contoso/oauth2/v2.0/token"))? });
	let credential = BrokerCredential::new(config, factory)?;
	let scopes = ScopeList::new(["https://graph.example/.default"])?;

	for _ in 0..2 {
		let result = credential.request_token(&scopes, &TokenRequestOptions::default()).await?;

		println!(
			"Acquired token (type {:?}, expires in {:?}s).",
			result.token_type, result.expires_in
		);
	}

	token_mock.assert_hits_async(2).await;

	let cached = credential.registry().cache(CapabilityMode::Standard).map_or(0, |cache| cache.len());

	println!("Standard cache holds {cached} token(s); {credential:?}");

	Ok(())
}
