//! The HTTP envelope around Shazam's `/discovery` recognition endpoint.
//!
//! A single [`recognize_song_from_signature`] call is one recognition
//! attempt: it builds the request, posts it once, and parses the
//! response. Retrying a failed attempt with backoff is the driver's job
//! (it may want to request a fresh signature between attempts), not this
//! module's.

use std::error::Error;
use std::fmt;
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use chrono_tz::Tz;
use mac_address::MacAddress;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::HeaderMap;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::Config;
use crate::fingerprinting::signature_format::DecodedSignature;
use crate::fingerprinting::user_agent::USER_AGENTS;

const DISCOVERY_URL_BASE: &str = "https://amp.shazam.com/discovery/v5/en/US/android/-/tag";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// A recognition attempt failed before a Shazam result could be parsed.
#[derive(Debug)]
pub enum RecognitionError {
    RequestFailed(String),
    InvalidJsonResponse(String),
}

impl fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionError::RequestFailed(detail) => write!(f, "request_failed: {}", detail),
            RecognitionError::InvalidJsonResponse(detail) => write!(f, "invalid_json_response: {}", detail),
        }
    }
}

impl Error for RecognitionError {}

pub fn recognize_song_from_signature(signature: &DecodedSignature) -> Result<Value, Box<dyn Error>> {
    recognize_song_from_signature_with_config(signature, &Config::default())
}

/// Perform one recognition attempt. Network or parse failures are not
/// propagated as an `Err`: they are folded into the `{matches: [],
/// error: "<kind>: <detail>"}` envelope the Shazam API itself uses for
/// soft failures, so callers only need to branch on the `matches` field.
pub fn recognize_song_from_signature_with_config(signature: &DecodedSignature, config: &Config) -> Result<Value, Box<dyn Error>> {
    match send_recognition_request(signature) {
        Ok(response) => Ok(response),
        Err(e) => {
            if !config.quiet_mode {
                eprintln!("Recognition attempt failed: {}", e);
            }
            Ok(json!({ "matches": [], "error": e.to_string() }))
        }
    }
}

fn send_recognition_request(signature: &DecodedSignature) -> Result<Value, RecognitionError> {
    let timestamp_ms = now_millis();
    let (altitude, latitude, longitude) = random_geolocation();

    let post_data = json!({
        "geolocation": {
            "altitude": altitude,
            "latitude": latitude,
            "longitude": longitude
        },
        "signature": {
            "samplems": (signature.number_samples as f64 / signature.sample_rate_hz as f64 * 1000.0).round() as u64,
            "timestamp": timestamp_ms,
            "uri": signature
                .encode_to_uri()
                .map_err(|e| RecognitionError::RequestFailed(e.to_string()))?
        },
        "timestamp": now_millis(),
        "timezone": random_europe_timezone()
    });

    let (uuid_1, uuid_2) = process_uuids();
    let url = format!("{}/{}/{}", DISCOVERY_URL_BASE, uuid_1, uuid_2);

    let mut headers = HeaderMap::new();
    let user_agent = USER_AGENTS
        .choose(&mut rand::thread_rng())
        .expect("USER_AGENTS is never empty");
    headers.insert(
        "User-Agent",
        user_agent.parse().map_err(|e: reqwest::header::InvalidHeaderValue| RecognitionError::RequestFailed(e.to_string()))?,
    );
    headers.insert("Content-Language", "en-US".parse().expect("static header value is valid"));

    let client = build_client().map_err(|e| RecognitionError::RequestFailed(e.to_string()))?;

    let response = client
        .post(&url)
        .query(&[
            ("sync", "true"),
            ("webv3", "true"),
            ("sampling", "true"),
            ("connected", ""),
            ("shazamapiversion", "v3"),
            ("sharehub", "true"),
            ("video", "v3"),
        ])
        .headers(headers)
        .json(&post_data)
        .send()
        .map_err(|e| RecognitionError::RequestFailed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RecognitionError::RequestFailed(format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown")
        )));
    }

    let response_text = response.text().map_err(|e| RecognitionError::RequestFailed(e.to_string()))?;

    serde_json::from_str(&response_text).map_err(|e| RecognitionError::InvalidJsonResponse(e.to_string()))
}

fn build_client() -> Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(10)
        .build()
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// altitude/latitude/longitude jittered by one shared draw of noise, as
/// Shazam's own Android client does, so the three don't vary independently.
fn random_geolocation() -> (f64, f64, f64) {
    let mut rng = rand::thread_rng();
    let fuzz: f64 = rng.gen_range(-7.65, 7.65);

    let altitude = rng.gen_range(100.0, 500.0) + fuzz;
    let latitude = (rng.gen_range(-90.0, 90.0) + fuzz).max(-90.0).min(90.0);
    let longitude = (rng.gen_range(-180.0, 180.0) + fuzz).max(-180.0).min(180.0);

    (altitude, latitude, longitude)
}

fn random_europe_timezone() -> String {
    let europe_zones: Vec<&Tz> = chrono_tz::TZ_VARIANTS.iter().filter(|tz| tz.name().starts_with("Europe/")).collect();

    europe_zones
        .choose(&mut rand::thread_rng())
        .map(|tz| tz.name().to_string())
        .unwrap_or_else(|| "UTC".to_string())
}

/// Two UUIDs derived deterministically from the host's MAC address,
/// computed once per process and reused for every recognition request
/// (mirroring how the real client ties a device identity to the MAC
/// rather than generating fresh random identifiers per call). Hosts with
/// no MAC (common in containers/VMs) fall back to a random 48-bit value
/// drawn once per process, the same way `uuid.getnode()` behaves in the
/// reference client — a fixed fallback like `0` would give every MAC-less
/// host the same device identity, which is the fingerprintable pattern
/// the randomized geolocation/user-agent are already there to avoid.
fn process_uuids() -> &'static (String, String) {
    static UUIDS: OnceLock<(String, String)> = OnceLock::new();
    UUIDS.get_or_init(|| {
        let mac_decimal = mac_address::get_mac_address()
            .ok()
            .flatten()
            .map(mac_address_to_decimal)
            .unwrap_or_else(|| rand::thread_rng().gen::<u64>() & 0xFFFF_FFFF_FFFF);
        let mac_string = mac_decimal.to_string();

        let first = Uuid::new_v5(&Uuid::NAMESPACE_DNS, mac_string.as_bytes()).to_string().to_uppercase();
        let second = Uuid::new_v5(&Uuid::NAMESPACE_URL, mac_string.as_bytes()).to_string();

        (first, second)
    })
}

fn mac_address_to_decimal(mac: MacAddress) -> u64 {
    mac.bytes().iter().fold(0u64, |acc, &byte| (acc << 8) | byte as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geolocation_stays_within_the_documented_ranges() {
        for _ in 0..200 {
            let (altitude, latitude, longitude) = random_geolocation();
            assert!((92.35..=507.65).contains(&altitude));
            assert!((-90.0..=90.0).contains(&latitude));
            assert!((-180.0..=180.0).contains(&longitude));
        }
    }

    #[test]
    fn timezone_is_always_a_europe_zone_or_the_utc_fallback() {
        let tz = random_europe_timezone();
        assert!(tz == "UTC" || tz.starts_with("Europe/"));
    }

    #[test]
    fn process_uuids_are_stable_across_calls() {
        let (a1, a2) = process_uuids();
        let (b1, b2) = process_uuids();
        assert_eq!(a1, b1);
        assert_eq!(a2, b2);
        assert_ne!(a1, a2);
    }

    #[test]
    fn first_uuid_is_uppercase_and_second_is_not() {
        let (first, second) = process_uuids();
        assert_eq!(first, &first.to_uppercase());
        assert_eq!(second, &second.to_lowercase());
    }

    #[test]
    fn recognition_error_messages_carry_their_kind() {
        let err = RecognitionError::RequestFailed("timed out".to_string());
        assert_eq!(err.to_string(), "request_failed: timed out");

        let err = RecognitionError::InvalidJsonResponse("unexpected eof".to_string());
        assert_eq!(err.to_string(), "invalid_json_response: unexpected eof");
    }
}
