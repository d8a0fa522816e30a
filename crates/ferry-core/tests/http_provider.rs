use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use ferry_core::Error;
use ferry_core::error::FetchFailure;
use ferry_core::provider::{
    FetchContext, GitHubProvider, HttpProvider, Locator, Provider, Providers, default_client,
};
use ferry_core::registry::{MemoryStateCache, MemoryTokenStore, RegistryResolver};

/// A request as seen by the responder.
#[derive(Debug, Clone)]
struct Seen {
    path: String,
    authorization: Option<String>,
}

/// Minimal HTTP/1.1 responder: canned `(status, body)` per path, 404 otherwise.
struct Responder {
    base: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Responder {
    async fn start(routes: &[(&str, u16, &str)]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let routes: HashMap<String, (u16, String)> = routes
            .iter()
            .map(|(path, status, body)| (path.to_string(), (*status, body.to_string())))
            .collect();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&head).into_owned();
                let path = head
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();
                let authorization = head.lines().find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("authorization")
                        .then(|| value.trim().to_string())
                });
                log.lock().unwrap().push(Seen {
                    path: path.clone(),
                    authorization,
                });

                let (status, body) = routes
                    .get(&path)
                    .cloned()
                    .unwrap_or((404, "Not Found".to_string()));
                let response = format!(
                    "HTTP/1.1 {} X\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self { base, seen }
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

fn github(server: &Responder) -> GitHubProvider {
    GitHubProvider::new(format!("{}/api", server.base), format!("{}/raw", server.base))
}

#[tokio::test]
async fn github_discovers_default_branch_and_sends_token() {
    let server = Responder::start(&[
        ("/api/repos/acme/std", 200, r#"{"default_branch": "trunk"}"#),
        ("/raw/acme/std/trunk/utils/math.ts", 200, "export const add = 1;\n"),
    ])
    .await;
    let provider = github(&server);
    let client = default_client().unwrap();
    let ctx = FetchContext {
        client: &client,
        token: Some("abc"),
    };

    let locator = provider.parse("github/acme/std", false).unwrap().locator;
    let state = provider.resolve_state(&locator, ctx).await.unwrap();
    assert_eq!(state.reference.as_deref(), Some("trunk"));

    let content = provider.fetch(&state, "utils/math.ts", ctx).await.unwrap();
    assert_eq!(content, "export const add = 1;\n");

    let seen = server.seen();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|s| s.authorization.as_deref() == Some("token abc")));
}

#[tokio::test]
async fn github_falls_back_to_main_when_discovery_fails() {
    let server = Responder::start(&[("/api/repos/acme/std", 500, "boom")]).await;
    let provider = github(&server);
    let client = default_client().unwrap();
    let ctx = FetchContext {
        client: &client,
        token: None,
    };

    let state = provider
        .resolve_state(&Locator::new("github/acme/std"), ctx)
        .await
        .unwrap();
    assert_eq!(state.reference.as_deref(), Some("main"));
    assert_eq!(state.base_url, format!("{}/raw/acme/std/main", server.base));
    assert_eq!(server.seen()[0].authorization, None);
}

#[tokio::test]
async fn github_pinned_ref_skips_discovery() {
    let server = Responder::start(&[]).await;
    let provider = github(&server);
    let client = default_client().unwrap();
    let ctx = FetchContext {
        client: &client,
        token: None,
    };

    let locator = provider
        .parse("https://github.com/acme/std/tree/v2", false)
        .unwrap()
        .locator;
    let state = provider.resolve_state(&locator, ctx).await.unwrap();
    assert_eq!(state.reference.as_deref(), Some("v2"));
    assert!(server.seen().is_empty());
}

#[tokio::test]
async fn missing_file_without_token_suggests_one() {
    let server = Responder::start(&[("/api/repos/acme/private", 404, "")]).await;
    let provider = github(&server);
    let client = default_client().unwrap();
    let ctx = FetchContext {
        client: &client,
        token: None,
    };

    let state = provider
        .resolve_state(&Locator::new("github/acme/private"), ctx)
        .await
        .unwrap();
    let err = provider.fetch(&state, "ferry-manifest.json", ctx).await.unwrap_err();
    assert_eq!(err.fetch_failure(), Some(FetchFailure::NotFound));
    assert!(err.to_string().contains("provide a token"));
}

#[tokio::test]
async fn unauthorized_with_token_is_reported_as_such() {
    let server = Responder::start(&[("/files/ferry-manifest.json", 401, "")]).await;
    let client = default_client().unwrap();
    let ctx = FetchContext {
        client: &client,
        token: Some("stale"),
    };

    let url = format!("{}/files", server.base);
    let locator = HttpProvider.parse(&url, false).unwrap().locator;
    let state = HttpProvider.resolve_state(&locator, ctx).await.unwrap();
    let err = HttpProvider
        .fetch(&state, "ferry-manifest.json", ctx)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ProviderFetch {
            failure: FetchFailure::Unauthorized,
            ..
        }
    ));
    assert_eq!(server.seen()[0].authorization.as_deref(), Some("Bearer stale"));
}

#[tokio::test]
async fn registry_resolver_reads_manifest_over_http() {
    let manifest = r#"{"categories": [{"name": "utils", "items": [
        {"name": "math", "category": "utils", "directory": "utils", "files": ["math.ts"]}
    ]}]}"#;
    let server = Responder::start(&[
        ("/reg/ferry-manifest.json", 200, manifest),
        ("/reg/utils/math.ts", 200, "export const add = 1;"),
    ])
    .await;
    let url = format!("{}/reg/", server.base);
    let resolver = RegistryResolver::new(Providers::default(), default_client().unwrap())
        .with_tokens(Arc::new(
            MemoryTokenStore::new().with_provider_token("http", "secret"),
        ))
        .with_cache(Arc::new(MemoryStateCache::new()));

    let registry = resolver.resolve(&url).await.unwrap();
    assert_eq!(registry.locator().as_str(), format!("{}/reg", server.base));
    assert_eq!(registry.manifest.items().count(), 1);

    let content = resolver.fetch(&registry, "utils/math.ts").await.unwrap();
    assert_eq!(content, "export const add = 1;");
    assert!(
        server
            .seen()
            .iter()
            .all(|s| s.authorization.as_deref() == Some("Bearer secret"))
    );
}
