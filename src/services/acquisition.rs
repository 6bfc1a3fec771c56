// src/services/acquisition.rs
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Datelike;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::AcquisitionConfig;
use crate::error::{Error, Result};
use crate::model::{BoundingBox, Credentials, DateRange, ProductType};

const EARTHDATA_LOGIN_HOST: &str = "urs.earthdata.nasa.gov";
const MAX_REDIRECTS: usize = 10;

/// A granule downloaded into the run folder.
#[derive(Debug, Clone)]
pub struct FetchedGranule {
    pub path: PathBuf,
    pub file_name: String,
    pub date_label: String,
}

/// Finds and downloads one granule of `product` covering `bbox`.
pub trait Acquisition {
    fn locate_and_fetch(
        &self,
        credentials: &Credentials,
        bbox: &BoundingBox,
        dates: &DateRange,
        product: ProductType,
        dest_dir: &Path,
    ) -> Result<FetchedGranule>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    feed: Feed,
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Clone, Deserialize)]
struct Entry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    time_start: Option<String>,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Clone, Deserialize)]
struct Link {
    href: String,
    #[serde(default)]
    rel: String,
}

impl Entry {
    /// The NetCDF data link; falls back to the second related URL.
    fn data_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel.ends_with("/data#") && l.href.ends_with(".nc"))
            .or_else(|| self.links.get(1))
            .map(|l| l.href.as_str())
    }
}

/// Search window one month earlier, or `None` once it would start before `earliest_year`.
pub fn next_search_window(dates: &DateRange, earliest_year: i32) -> Option<DateRange> {
    let previous = dates.previous_month();
    (previous.start.year() >= earliest_year).then_some(previous)
}

/// Last path segment of a download URL.
pub fn file_name_from_url(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

/// NASA CMR granule search with Earthdata Login downloads.
pub struct CmrAcquisition {
    config: AcquisitionConfig,
    client: Client,
}

impl CmrAcquisition {
    pub fn new(config: AcquisitionConfig) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .timeout(Duration::from_secs(600))
            .build()?;
        Ok(Self { config, client })
    }

    fn search(&self, product: ProductType, bbox: &BoundingBox, dates: &DateRange) -> Result<Vec<Entry>> {
        let page_size = self.config.page_size.to_string();
        let response: SearchResponse = self
            .client
            .get(&self.config.search_endpoint)
            .query(&[
                ("short_name", product.short_name()),
                ("bounding_box", bbox.to_cmr().as_str()),
                ("temporal", dates.to_cmr().as_str()),
                ("page_size", page_size.as_str()),
            ])
            .send()?
            .error_for_status()?
            .json()?;
        debug!(
            product = product.short_name(),
            start = %dates.start,
            hits = response.feed.entry.len(),
            "granule search"
        );
        Ok(response.feed.entry)
    }

    /// Search, stepping the start date back a month at a time while nothing is found.
    fn search_with_fallback(
        &self,
        product: ProductType,
        bbox: &BoundingBox,
        dates: &DateRange,
    ) -> Result<(Entry, DateRange)> {
        let mut window = *dates;
        loop {
            if let Some(entry) = self.search(product, bbox, &window)?.into_iter().next() {
                return Ok((entry, window));
            }
            window = next_search_window(&window, self.config.earliest_year).ok_or_else(|| {
                Error::Acquisition(format!(
                    "no {} granule found for {} since {}",
                    product.short_name(),
                    bbox,
                    self.config.earliest_year
                ))
            })?;
            info!(start = %window.start, "no granule found, searching from earlier date");
        }
    }

    /// GET following redirects by hand so credentials only go to the login host.
    fn download(&self, credentials: &Credentials, url: &str, dest: &Path) -> Result<()> {
        let mut current = Url::parse(url).map_err(|e| Error::Acquisition(format!("bad url {url}: {e}")))?;
        for _ in 0..MAX_REDIRECTS {
            let mut request = self.client.get(current.clone());
            if current.host_str() == Some(EARTHDATA_LOGIN_HOST) {
                request = request.basic_auth(&credentials.username, Some(&credentials.password));
            }
            let response = request.send()?;

            if response.status().is_redirection() {
                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| Error::Acquisition("redirect without location".into()))?;
                current = current
                    .join(location)
                    .map_err(|e| Error::Acquisition(format!("bad redirect {location}: {e}")))?;
                continue;
            }

            let mut response = response.error_for_status()?;
            let mut file = File::create(dest)?;
            let bytes = response.copy_to(&mut file)?;
            info!(path = %dest.display(), bytes, "granule downloaded");
            return Ok(());
        }
        Err(Error::Acquisition(format!("too many redirects fetching {url}")))
    }
}

impl Acquisition for CmrAcquisition {
    fn locate_and_fetch(
        &self,
        credentials: &Credentials,
        bbox: &BoundingBox,
        dates: &DateRange,
        product: ProductType,
        dest_dir: &Path,
    ) -> Result<FetchedGranule> {
        info!(product = product.short_name(), bbox = %bbox, "searching granules");
        let (entry, window) = self.search_with_fallback(product, bbox, dates)?;

        let url = entry
            .data_url()
            .ok_or_else(|| Error::Acquisition(format!("granule {} has no data link", entry.title)))?;
        let file_name = file_name_from_url(url);
        let path = dest_dir.join(&file_name);
        info!(granule = %file_name, "downloading");
        self.download(credentials, url, &path)?;

        let date_label = entry
            .time_start
            .as_deref()
            .and_then(|t| t.get(..10))
            .map(str::to_string)
            .unwrap_or_else(|| window.start.to_string());

        Ok(FetchedGranule {
            path,
            file_name,
            date_label,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn stepping_stops_at_earliest_year() {
        let dates: DateRange = "2022-02-01,2022-02-28".parse().unwrap();
        let jan = next_search_window(&dates, 2022).unwrap();
        assert_eq!(jan.start, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert!(next_search_window(&jan, 2022).is_none());
    }

    #[test]
    fn picks_netcdf_data_link() {
        let entry: Entry = serde_json::from_str(
            r#"{"title": "g", "links": [
                {"href": "https://x/browse.png", "rel": "http://esipfed.org/ns/fedsearch/1.1/browse#"},
                {"href": "https://x/EMIT_L2A_RFL.nc", "rel": "http://esipfed.org/ns/fedsearch/1.1/data#"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(entry.data_url(), Some("https://x/EMIT_L2A_RFL.nc"));
        assert_eq!(file_name_from_url("https://x/y/EMIT_L2A_RFL.nc"), "EMIT_L2A_RFL.nc");
    }
}
