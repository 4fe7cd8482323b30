//! GraphQL API client.
//!
//! Requests are built and serialised here, then handed to a [`Transport`]
//! for delivery.  The production transport is [`HttpTransport`]
//! (`reqwest::blocking`); tests swap in a recording fake so nothing here
//! needs a live server.
//!
//! With `--get-curl` the request is never sent: [`Client::execute`] returns
//! the equivalent `curl` invocation instead.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::{cli::ApiFlags, config::Config, error::Error};

/// Path of the GraphQL endpoint relative to the instance URL.
pub const GRAPHQL_PATH: &str = "/.api/graphql";

/// Header that asks the server to record a trace for the request.
pub const TRACE_HEADER: &str = "X-Sourcegraph-Should-Trace";

/// Response header carrying the trace URL.
pub const TRACE_RESPONSE_HEADER: &str = "x-trace";

// ─── Request / response ───────────────────────────────────────────────────────

/// A single GraphQL operation.
#[derive(Debug, Clone)]
pub struct Request {
    /// Operation name, appended to the URL as `?<name>` for server-side logs.
    pub name: &'static str,
    pub query: &'static str,
    pub variables: serde_json::Value,
}

#[derive(Serialize)]
struct Payload<'a> {
    query: &'a str,
    variables: &'a serde_json::Value,
}

impl Request {
    /// JSON body sent to the server.
    pub fn body(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&Payload {
            query: self.query,
            variables: &self.variables,
        })?)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<D> {
    data: Option<D>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// What the transport hands back: the raw HTTP result.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub trace: Option<String>,
    pub body: String,
}

/// Result of [`Client::execute`].
#[derive(Debug)]
pub enum Outcome<D> {
    /// `--get-curl` was set; nothing was sent.
    Curl(String),
    /// The request succeeded.
    Data { data: Option<D>, trace: Option<String> },
}

// ─── Transport ────────────────────────────────────────────────────────────────

/// Delivers a serialised request and returns the raw response.
pub trait Transport {
    fn post(&self, url: &str, headers: &[(String, String)], body: String) -> Result<RawResponse, Error>;
}

/// Blocking HTTP transport backed by `reqwest`.
pub struct HttpTransport {
    http: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(insecure_skip_verify: bool) -> Result<Self, Error> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("src-rs/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(insecure_skip_verify)
            .build()?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn post(&self, url: &str, headers: &[(String, String)], body: String) -> Result<RawResponse, Error> {
        let mut req = self.http.post(url).body(body);
        for (name, value) in headers {
            req = req.header(name.as_str(), value.as_str());
        }
        let resp = req.send()?;

        let status = resp.status().as_u16();
        let trace = resp
            .headers()
            .get(TRACE_RESPONSE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = resp.text()?;
        Ok(RawResponse { status, trace, body })
    }
}

// ─── Client ───────────────────────────────────────────────────────────────────

pub struct Client<T = HttpTransport> {
    config: Config,
    flags: ApiFlags,
    transport: T,
}

impl Client<HttpTransport> {
    pub fn new(config: Config, flags: ApiFlags) -> Result<Self, Error> {
        let transport = HttpTransport::new(flags.insecure_skip_verify)?;
        Ok(Self::with_transport(config, flags, transport))
    }
}

impl<T: Transport> Client<T> {
    pub const fn with_transport(config: Config, flags: ApiFlags, transport: T) -> Self {
        Self {
            config,
            flags,
            transport,
        }
    }

    #[cfg(test)]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub const fn flags(&self) -> &ApiFlags {
        &self.flags
    }

    /// Full URL for `req`.
    pub fn url(&self, req: &Request) -> String {
        format!("{}{GRAPHQL_PATH}?{}", self.config.endpoint, req.name)
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(token) = &self.config.access_token {
            headers.push(("Authorization".into(), format!("token {token}")));
        }
        if self.flags.trace {
            headers.push((TRACE_HEADER.into(), "true".into()));
        }
        headers.extend(
            self.config
                .additional_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        headers
    }

    /// The `curl` command equivalent to sending `req`.
    pub fn curl(&self, req: &Request) -> Result<String, Error> {
        let mut cmd = String::from("curl \\\n");
        for (name, value) in self.headers() {
            let _ = writeln!(cmd, "   -H {} \\", shell_quote(&format!("{name}: {value}")));
        }
        let _ = writeln!(cmd, "   -d {} \\", shell_quote(&req.body()?));
        cmd.push_str("   ");
        cmd.push_str(&shell_quote(&self.url(req)));
        Ok(cmd)
    }

    /// Send `req` once and decode its `data`.
    ///
    /// Transport failures, non-2xx statuses and GraphQL `errors` are returned
    /// as-is; nothing is retried.
    pub fn execute<D: DeserializeOwned>(&self, req: &Request) -> Result<Outcome<D>, Error> {
        if self.flags.get_curl {
            return Ok(Outcome::Curl(self.curl(req)?));
        }

        let url = self.url(req);
        let body = req.body()?;
        if self.flags.dump_requests {
            eprintln!("> POST {url}\n> {body}");
        }
        debug!(%url, operation = req.name, "sending GraphQL request");

        let raw = self.transport.post(&url, &self.headers(), body)?;
        if self.flags.dump_requests {
            eprintln!("< {}\n< {}", raw.status, raw.body);
        }
        if let Some(trace) = &raw.trace {
            info!(%trace, "request traced");
        }

        if !(200..300).contains(&raw.status) {
            return Err(Error::Status {
                status: raw.status,
                body: raw.body,
            });
        }

        let envelope: Envelope<D> = serde_json::from_str(&raw.body)?;
        if !envelope.errors.is_empty() {
            return Err(Error::GraphQl(
                envelope.errors.into_iter().map(|e| e.message).collect(),
            ));
        }
        Ok(Outcome::Data {
            data: envelope.data,
            trace: raw.trace,
        })
    }
}

/// Quote `s` for a POSIX shell.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
