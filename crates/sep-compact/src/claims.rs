//! Claim resolution.
//!
//! Turns a verified payload `{"s": cid, "d": cid, "t": cid}` into the three
//! documents those identifiers address. Ordering is strict:
//! 1. All three fields present (else one `MissingClaim` naming every gap)
//! 2. All three parse as content identifiers
//! 3. Only then fetch, concurrently; the first failure cancels the rest

use serde_json::Value;
use tracing::debug;

use crate::content_id::ContentId;
use crate::error::{DecodeError, DecodeResult};
use crate::fetch::Fetcher;
use crate::types::{Claim, ClaimField, Payload, RawPayload};

/// Resolves claim identifiers into documents.
#[derive(Debug, Clone)]
pub struct ClaimsResolver {
    fetcher: Fetcher,
}

impl ClaimsResolver {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Resolve the three claims of a verified payload.
    pub async fn resolve(&self, raw: &RawPayload) -> DecodeResult<Payload> {
        let [s, d, t] = claim_ids(raw)?;

        debug!(s = %s, d = %d, t = %t, "resolving claims");

        // try_join! polls all three on this task and drops the pending ones
        // as soon as any returns an error.
        let (s, d, t) = tokio::try_join!(
            self.resolve_one(ClaimField::S, &s),
            self.resolve_one(ClaimField::D, &d),
            self.resolve_one(ClaimField::T, &t),
        )?;

        Ok(Payload { s, d, t })
    }

    async fn resolve_one(&self, field: ClaimField, cid: &ContentId) -> DecodeResult<Claim> {
        let data = self.fetcher.fetch(cid).await?;
        parse_claim(field, cid, &data)
    }
}

/// Validate presence, then parse, all three claim identifiers.
///
/// Performs no I/O.
pub fn claim_ids(raw: &RawPayload) -> DecodeResult<[ContentId; 3]> {
    let values = ClaimField::ALL.map(|field| raw.claim(field));

    match values {
        [Some(s), Some(d), Some(t)] => Ok([
            parse_claim_id(ClaimField::S, s)?,
            parse_claim_id(ClaimField::D, d)?,
            parse_claim_id(ClaimField::T, t)?,
        ]),
        _ => Err(DecodeError::MissingClaim {
            fields: ClaimField::ALL
                .into_iter()
                .zip(values)
                .filter_map(|(field, value)| value.is_none().then_some(field))
                .collect(),
        }),
    }
}

fn parse_claim_id(field: ClaimField, value: &Value) -> DecodeResult<ContentId> {
    let Some(text) = value.as_str() else {
        return Err(DecodeError::InvalidClaimId {
            field,
            value: value.to_string(),
            reason: "claim is not a string".to_string(),
        });
    };

    ContentId::parse(text).map_err(|e| DecodeError::InvalidClaimId {
        field,
        value: text.to_string(),
        reason: e.reason,
    })
}

fn parse_claim(field: ClaimField, cid: &ContentId, data: &[u8]) -> DecodeResult<Claim> {
    let format_error = |reason: String| DecodeError::ClaimFormat {
        field,
        cid: cid.to_string(),
        reason,
    };

    let text = std::str::from_utf8(data).map_err(|e| format_error(format!("not UTF-8: {}", e)))?;
    serde_json::from_str(text).map_err(|e| format_error(e.to_string()))
}
