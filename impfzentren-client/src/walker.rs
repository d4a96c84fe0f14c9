//! Resource walker: vaccines, districts and the district → center → site tree

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::auth::bearer::{TokenField, authorization_header};
use crate::error::Result;
use crate::http_client::{HttpRequest, HttpUtils};
use crate::rotator::IdentityRotator;
use crate::types::{ApiId, ApiSite, CenterIndex, District, SiteMap, SiteRecord};

const COMPONENT: &str = "walker";

/// One-shot REST reads, each on the next identity of the rotator.
pub struct ResourceWalker<'a> {
    rotator: &'a IdentityRotator,
    token_field: TokenField,
}

impl<'a> ResourceWalker<'a> {
    pub fn new(rotator: &'a IdentityRotator, token_field: TokenField) -> Self {
        Self {
            rotator,
            token_field,
        }
    }

    /// GET `path` on the api host of the next identity and parse the body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let member = self.rotator.next();
        let (header, value) = authorization_header(&member.tokens, self.token_field)?;
        let url = HttpUtils::parse_url(&format!("{}{path}", member.identity.env.api_base()))?;

        let request = HttpRequest::get(url).header(header, value);
        let display_url = request.display_url();
        let response = member.session.send(request, COMPONENT).await?;
        let response = HttpUtils::ensure_success(response, &display_url, COMPONENT)?;

        HttpUtils::parse_json(&response.body, COMPONENT)
    }

    /// Vaccine catalogue, passed through unchanged.
    pub async fn list_vaccines(&self) -> Result<Value> {
        log::info!("[{COMPONENT}] Getting vaccines");
        self.get_json("/api/v1/vaccines/").await
    }

    pub async fn list_districts(&self) -> Result<Vec<District>> {
        log::info!("[{COMPONENT}] Getting districts");
        self.get_json("/api/v1/districts/").await
    }

    /// Sites of one center, keyed by site id.
    pub async fn list_sites_for_center(&self, center_id: &ApiId) -> Result<SiteMap> {
        log::info!("[{COMPONENT}] Getting sites for center {center_id}");
        let path = format!(
            "/api/v1/centers/{}/sites",
            urlencoding::encode(&center_id.to_string())
        );
        let sites: Vec<ApiSite> = self.get_json(&path).await?;

        Ok(sites
            .into_iter()
            .map(|site| {
                let (site_id, record) = SiteRecord::from_api(site, center_id);
                log::debug!("[{COMPONENT}] Site {site_id} ({})", record.display_name());
                (site_id, record)
            })
            .collect())
    }

    /// District name → center ids. No network access.
    pub fn build_center_index(districts: &[District]) -> CenterIndex {
        districts
            .iter()
            .map(|district| {
                (
                    district.name.clone(),
                    district.centers.iter().map(|c| c.id.clone()).collect(),
                )
            })
            .collect()
    }

    /// Sites of every center in the index, merged by site id.
    ///
    /// Centers are visited in index order. A site id seen twice keeps its
    /// first position and gets the record of the later center.
    pub async fn list_all_sites(&self, index: &CenterIndex) -> Result<SiteMap> {
        let mut all = SiteMap::new();
        for center_ids in index.values() {
            for center_id in center_ids {
                for (site_id, record) in self.list_sites_for_center(center_id).await? {
                    if let Some(previous) = all.insert(site_id.clone(), record) {
                        log::debug!(
                            "[{COMPONENT}] Site {site_id} listed again, replacing entry of center {}",
                            previous.center
                        );
                    }
                }
            }
        }
        Ok(all)
    }
}
