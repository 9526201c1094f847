//! HTTP repository client

use crate::auth::TokenSigner;
use crate::link::described_by;
use async_trait::async_trait;
use quarry_config::RepositoryConfig;
use quarry_core::{FetchError, ResourceGraph, ResourceId, ResourceSource};
use reqwest::header::{ACCEPT, CONTENT_TYPE, LINK};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, info};

/// Media type requested for RDF descriptions
pub const NTRIPLES: &str = "application/n-triples";

/// Map a response status to the fetch error taxonomy
pub fn classify_status(uri: &str, status: StatusCode) -> Result<(), FetchError> {
    match status {
        s if s.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(FetchError::auth(
            uri,
            format!("repository refused access ({status})"),
        )),
        StatusCode::NOT_FOUND | StatusCode::GONE => Err(FetchError::not_found(uri)),
        _ => Err(FetchError::network(
            uri,
            format!("unexpected response status {status}"),
        )),
    }
}

/// Repository client over HTTP
#[derive(Debug, Clone)]
pub struct RepositoryClient {
    client: Client,
    endpoint: String,
    signer: Option<TokenSigner>,
}

impl RepositoryClient {
    /// Create a client with a default `reqwest` client
    pub fn new(config: &RepositoryConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &RepositoryConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            signer: config.jwt_secret.as_deref().map(TokenSigner::new),
        }
    }

    fn get(&self, uri: &str) -> Result<RequestBuilder, FetchError> {
        let request = self.client.get(uri);
        match &self.signer {
            Some(signer) => Ok(request.bearer_auth(signer.token(uri)?)),
            None => Ok(request),
        }
    }

    async fn send(&self, uri: &str, request: RequestBuilder) -> Result<Response, FetchError> {
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::network(uri, e.to_string()))?;
        classify_status(uri, response.status())?;
        Ok(response)
    }

    async fn get_ntriples(&self, uri: &str) -> Result<Response, FetchError> {
        let request = self.get(uri)?.header(ACCEPT, NTRIPLES);
        self.send(uri, request).await
    }
}

fn is_ntriples(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(NTRIPLES))
}

#[async_trait]
impl ResourceSource for RepositoryClient {
    async fn fetch(&self, id: &ResourceId) -> Result<ResourceGraph, FetchError> {
        info!("Fetching {}", id.uri);
        let mut response = self.get_ntriples(&id.uri).await?;

        let description = described_by(
            response
                .headers()
                .get_all(LINK)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        );

        // Binaries answer with their own bytes; their RDF lives at the
        // describedby target.
        let described_by = match description {
            Some(url) if !is_ntriples(&response) => {
                debug!("{} is described by {url}", id.uri);
                response = self.get_ntriples(&url).await?;
                Some(url)
            }
            _ => None,
        };

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(&id.uri, e.to_string()))?;
        let graph = ResourceGraph::from_ntriples(id, &body)?;
        debug!("Fetched {} triples for {}", graph.triples.len(), id.uri);
        Ok(graph.with_described_by(described_by))
    }

    async fn fetch_binary(&self, uri: &str) -> Result<Vec<u8>, FetchError> {
        info!("Fetching binary {uri}");
        let request = self.get(uri)?;
        let response = self.send(uri, request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(uri, e.to_string()))?;
        Ok(body.to_vec())
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::FetchErrorKind;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String, secret: Option<&str>) -> RepositoryConfig {
        RepositoryConfig {
            endpoint,
            jwt_secret: secret.map(str::to_string),
        }
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status("u", StatusCode::OK).is_ok());
        assert_eq!(
            classify_status("u", StatusCode::FORBIDDEN).unwrap_err().kind,
            FetchErrorKind::Auth
        );
        assert_eq!(
            classify_status("u", StatusCode::GONE).unwrap_err().kind,
            FetchErrorKind::NotFound
        );
        assert_eq!(
            classify_status("u", StatusCode::BAD_GATEWAY).unwrap_err().kind,
            FetchErrorKind::Network
        );
    }

    #[tokio::test]
    async fn test_fetch_sends_accept_and_bearer() {
        let server = MockServer::start().await;
        let body = format!(
            "<{}/rest/obj> <http://purl.org/dc/terms/title> \"Title\" .\n",
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/rest/obj"))
            .and(header("Accept", NTRIPLES))
            .and(header_exists("Authorization"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", NTRIPLES)
                    .set_body_string(body),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = RepositoryClient::new(&config(format!("{}/rest", server.uri()), Some("s3cret")));
        let graph = client.fetch(&client.resource_id("/obj")).await.unwrap();

        assert_eq!(graph.path, "/obj");
        assert_eq!(graph.triples.len(), 1);
        assert_eq!(graph.described_by, None);
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = RepositoryClient::new(&config(server.uri(), None));
        let err = client.fetch(&client.resource_id("/obj")).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Auth);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Nothing listens on the discard port
        let client = RepositoryClient::new(&config("http://127.0.0.1:9".to_string(), None));
        let err = client.fetch_binary("http://127.0.0.1:9/x").await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Network);
    }
}
