use regex::{RegexSet, RegexSetBuilder};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::Error;

/// Minimum accepted length of a `User-Agent` header, in characters.
pub const MIN_USER_AGENT_LEN: usize = 10;

/// User-agent patterns that identify automated clients. Matched case-insensitively.
pub const DEFAULT_BOT_PATTERNS: &[&str] = &[
    // generic identifiers
    "bot",
    "crawler",
    "spider",
    "scraper",
    // search engines
    "googlebot",
    "bingbot",
    "slurp",
    "duckduckbot",
    "baiduspider",
    "yandexbot",
    // AI crawlers
    "gptbot",
    "chatgpt-user",
    "ccbot",
    "anthropic-ai",
    "claude-web",
    "perplexitybot",
    "bytespider",
    // SEO tools
    "ahrefsbot",
    "semrushbot",
    "mj12bot",
    "dotbot",
    "petalbot",
    // social previews
    "facebookexternalhit",
    "twitterbot",
    "linkedinbot",
    "whatsapp",
    "telegrambot",
    "slackbot",
    "discordbot",
    // security scanners
    "nikto",
    "sqlmap",
    "nmap",
    "masscan",
    "zgrab",
    "nuclei",
    // scripting HTTP clients
    "curl",
    "wget",
    "python-requests",
    "python-urllib",
    "go-http-client",
    "java/",
    "okhttp",
    "axios",
    "node-fetch",
    "libwww-perl",
    "httpclient",
    // headless automation
    "headlesschrome",
    "phantomjs",
    "selenium",
    "puppeteer",
    "playwright",
    // empty user agent
    "^$",
];

/// Reasons a request is refused before it touches the counter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing origin header")]
    MissingOrigin,

    #[error("Origin \"{0}\" is not authorized")]
    UnauthorizedOrigin(String),

    #[error("Invalid user agent")]
    InvalidUserAgent,

    #[error("Automated requests not allowed")]
    AutomatedClient,
}

impl ValidationError {
    /// HTTP status returned to the caller.
    pub fn status(&self) -> u16 {
        match self {
            ValidationError::MissingOrigin => 400,
            ValidationError::UnauthorizedOrigin(_)
            | ValidationError::InvalidUserAgent
            | ValidationError::AutomatedClient => 403,
        }
    }

    /// Stable machine-readable reason, used in logs.
    pub fn reason_code(&self) -> &'static str {
        match self {
            ValidationError::MissingOrigin => "missing_origin",
            ValidationError::UnauthorizedOrigin(_) => "origin_not_allowed",
            ValidationError::InvalidUserAgent => "invalid_user_agent",
            ValidationError::AutomatedClient => "automated_client",
        }
    }
}

/// A request that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedRequest {
    pub origin: String,
    pub source_ip: String,
    pub user_agent: String,
}

/// Origin allow-list and bot filter, built once at start-up.
pub struct RequestValidator {
    allowed_origins: Vec<String>,
    bot_patterns: RegexSet,
}

impl RequestValidator {
    pub fn new<O, P>(allowed_origins: O, bot_patterns: P) -> Result<Self, Error>
    where
        O: IntoIterator,
        O::Item: Into<String>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let mut origins: Vec<String> = Vec::new();
        for origin in allowed_origins {
            let origin = origin.into();
            if !origins.contains(&origin) {
                origins.push(origin);
            }
        }

        let bot_patterns = RegexSetBuilder::new(bot_patterns)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Configuration(format!("Invalid bot pattern: {}", e)))?;

        Ok(Self {
            allowed_origins: origins,
            bot_patterns,
        })
    }

    /// Validator using the built-in bot pattern list.
    pub fn with_default_patterns<O>(allowed_origins: O) -> Result<Self, Error>
    where
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self::new(allowed_origins, DEFAULT_BOT_PATTERNS)
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }

    pub fn is_automated(&self, user_agent: &str) -> bool {
        self.bot_patterns.is_match(user_agent)
    }

    /// Runs the checks in order; the first failure wins.
    pub fn validate(
        &self,
        headers: &HashMap<String, String>,
        source_ip: &str,
    ) -> Result<AcceptedRequest, ValidationError> {
        let origin = header(headers, "origin");
        let user_agent = header(headers, "user-agent");

        if let Err(err) = self.check(origin, user_agent) {
            warn!(
                origin = origin.unwrap_or("-"),
                user_agent = user_agent.unwrap_or("-"),
                source_ip = %source_ip,
                reason = err.reason_code(),
                "Request rejected: {}",
                err
            );
            return Err(err);
        }

        // Both are present once check() has passed.
        let origin = origin.unwrap_or_default();
        let user_agent = user_agent.unwrap_or_default();

        if let Some(referer) = header(headers, "referer").filter(|r| !r.is_empty()) {
            if !referer.starts_with(origin) {
                warn!(
                    origin = %origin,
                    referer = %referer,
                    source_ip = %source_ip,
                    "Referer does not match origin"
                );
            }
        }

        info!(
            origin = %origin,
            source_ip = %source_ip,
            user_agent = %user_agent,
            "Request accepted"
        );

        Ok(AcceptedRequest {
            origin: origin.to_string(),
            source_ip: source_ip.to_string(),
            user_agent: user_agent.to_string(),
        })
    }

    fn check(&self, origin: Option<&str>, user_agent: Option<&str>) -> Result<(), ValidationError> {
        let origin = origin
            .filter(|o| !o.trim().is_empty())
            .ok_or(ValidationError::MissingOrigin)?;

        if !self.is_origin_allowed(origin) {
            return Err(ValidationError::UnauthorizedOrigin(origin.to_string()));
        }

        let user_agent = user_agent.ok_or(ValidationError::InvalidUserAgent)?;
        if user_agent.chars().count() < MIN_USER_AGENT_LEN {
            return Err(ValidationError::InvalidUserAgent);
        }

        if self.is_automated(user_agent) {
            return Err(ValidationError::AutomatedClient);
        }

        Ok(())
    }
}

/// Case-insensitive header lookup.
fn header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .or_else(|| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
        .map(String::as_str)
}
