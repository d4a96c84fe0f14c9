//! Appointment prober
//!
//! One next-appointment query per site, each on the next identity of the
//! rotator. Per-site failures never abort the sweep: they are classified
//! into a [`ProbeOutcome`] and recorded as "no appointment".

use chrono::{Local, NaiveDateTime};

use crate::auth::bearer::{TokenField, authorization_header};
use crate::error::{ClientError, Result};
use crate::http_client::{HttpRequest, HttpResponse, HttpUtils};
use crate::rotator::IdentityRotator;
use crate::types::{NextAppointment, ProbeOutcome, SiteMap, SiteRecord};

const COMPONENT: &str = "prober";

/// `lastTime` sent with every query: the whole day is searched.
const LAST_TIME: &str = "00:00";
const TIME_OF_DAY: &str = "ALL_DAY";

pub struct AppointmentProber<'a> {
    rotator: &'a IdentityRotator,
    token_field: TokenField,
}

impl<'a> AppointmentProber<'a> {
    pub fn new(rotator: &'a IdentityRotator, token_field: TokenField) -> Self {
        Self {
            rotator,
            token_field,
        }
    }

    /// Probe one site and return its record with the probe result stored.
    ///
    /// Every outcome stamps `lastcheck`, failed requests included.
    ///
    /// # Errors
    /// [`ClientError::MissingToken`] when the rotated identity has no usable
    /// token. The header is built before any request is sent.
    pub async fn probe(&self, site_id: &str, mut site: SiteRecord) -> Result<SiteRecord> {
        let outcome = self.query(site_id, Local::now().naive_local()).await?;
        log_outcome(site_id, &site, &outcome);
        site.record_probe(&outcome, Local::now().naive_local());
        Ok(site)
    }

    /// Probe every site sequentially, in map order.
    pub async fn probe_all(&self, sites: SiteMap) -> Result<SiteMap> {
        log::info!("[{COMPONENT}] Probing {} sites", sites.len());
        let mut probed = SiteMap::with_capacity(sites.len());
        for (site_id, site) in sites {
            let site = self.probe(&site_id, site).await?;
            probed.insert(site_id, site);
        }
        Ok(probed)
    }

    async fn query(&self, site_id: &str, now: NaiveDateTime) -> Result<ProbeOutcome> {
        let member = self.rotator.next();
        let (header, value) = authorization_header(&member.tokens, self.token_field)?;
        let url = HttpUtils::parse_url(&format!(
            "{}/api/v1/citizens/{}/appointments/next",
            member.identity.env.api_base(),
            urlencoding::encode(&member.identity.user_uuid)
        ))?;

        let today = now.date().format("%Y-%m-%d").to_string();
        let request = HttpRequest::get(url)
            .query("timeOfDay", TIME_OF_DAY)
            .query("lastDate", &today)
            .query("lastTime", LAST_TIME)
            .query("possibleSiteId", site_id)
            .header(header, value);

        Ok(classify(member.session.send(request, COMPONENT).await))
    }
}

/// Map a probe response, or the failure to get one, to its outcome.
pub fn classify(response: Result<HttpResponse>) -> ProbeOutcome {
    let response = match response {
        Ok(response) => response,
        Err(e) => return ProbeOutcome::Transport(e),
    };

    match response.status {
        200..=202 => match serde_json::from_str::<NextAppointment>(&response.body) {
            Ok(next) => ProbeOutcome::Available(next.into()),
            Err(e) => ProbeOutcome::Malformed(ClientError::ParseError {
                detail: e.to_string(),
            }),
        },
        404 => ProbeOutcome::NotFound,
        status => ProbeOutcome::UnexpectedStatus(status),
    }
}

fn log_outcome(site_id: &str, site: &SiteRecord, outcome: &ProbeOutcome) {
    let name = site.display_name();
    match outcome {
        ProbeOutcome::Available(slot) => log::info!(
            "[{COMPONENT}] Site {site_id} ({name}): {} {} vaccine {}",
            slot.date,
            slot.time,
            slot.vaccine
        ),
        ProbeOutcome::NotFound => {
            log::debug!("[{COMPONENT}] Site {site_id} ({name}): no appointment");
        }
        ProbeOutcome::UnexpectedStatus(status) => {
            log::warn!("[{COMPONENT}] Site {site_id} ({name}): HTTP {status}");
        }
        ProbeOutcome::Malformed(e) | ProbeOutcome::Transport(e) => {
            log::warn!("[{COMPONENT}] Site {site_id} ({name}): {e}");
        }
    }
}
