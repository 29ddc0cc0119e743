//! HTTP client for Data.gov.sg, LTA DataMall and OneMap.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::types::{
    CarparkAvailabilityResponse, DailyForecastData, DataMallPage, FloodAlertsResponse,
    InitiateDownloadResponse, OneMapSearchResponse, OneMapToken, PsiData, RealtimeData,
    RealtimeResponse, TaxiAvailability, TrafficImagesResponse, TwoHourForecastResponse, UvData,
    WbgtData,
};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::weather::RealtimeEndpoint;

/// DataMall returns at most this many records per request.
pub const DATAMALL_PAGE_SIZE: usize = 500;

/// Give up on a DataMall dataset that is still returning full pages after
/// this many requests.
pub const DATAMALL_MAX_PAGES: usize = 200;

/// Async client for every upstream API sgdash talks to.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api: ApiConfig,
}

impl ApiClient {
    /// Build a client from API settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(api: &ApiConfig, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(api.user_agent.clone())
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            api: api.clone(),
        })
    }

    /// Latest image of every traffic camera.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or a bad body.
    pub async fn traffic_images(&self) -> Result<TrafficImagesResponse> {
        let url = format!("{}/transport/traffic-images", self.api.data_gov_url);
        self.get_json(self.http.get(&url), &url).await
    }

    /// Positions of every available taxi.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or a bad body.
    pub async fn taxi_availability(&self) -> Result<TaxiAvailability> {
        let url = format!("{}/transport/taxi-availability", self.api.data_gov_url);
        self.get_json(self.http.get(&url), &url).await
    }

    /// Lot availability of every HDB carpark.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or a bad body.
    pub async fn carpark_availability(&self) -> Result<CarparkAvailabilityResponse> {
        let url = format!("{}/transport/carpark-availability", self.api.data_gov_url);
        self.get_json(self.http.get(&url), &url).await
    }

    /// Latest readings of a realtime weather endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] when the API reports a non-zero code.
    pub async fn realtime(&self, endpoint: RealtimeEndpoint) -> Result<RealtimeData> {
        self.realtime_json(endpoint.path()).await
    }

    /// Latest PSI and pollutant readings per region.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] when the API reports a non-zero code.
    pub async fn psi(&self) -> Result<PsiData> {
        self.realtime_json("psi").await
    }

    /// Today's hourly UV index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] when the API reports a non-zero code.
    pub async fn uv_index(&self) -> Result<UvData> {
        self.realtime_json("uv").await
    }

    /// Latest wet-bulb globe temperature per station.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] when the API reports a non-zero code.
    pub async fn wbgt(&self) -> Result<WbgtData> {
        self.realtime_json("weather?api=wbgt").await
    }

    /// Island-wide 24-hour forecast.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] when the API reports a non-zero code.
    pub async fn daily_forecast(&self) -> Result<DailyForecastData> {
        self.realtime_json("twenty-four-hr-forecast").await
    }

    /// 2-hour forecast per area.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or a bad body.
    pub async fn two_hour_forecast(&self) -> Result<TwoHourForecastResponse> {
        let url = format!("{}/environment/2-hour-weather-forecast", self.api.data_gov_url);
        self.get_json(self.data_gov_get(&url), &url).await
    }

    /// Flood alerts currently in force.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or a bad body.
    pub async fn flood_alerts(&self) -> Result<FloodAlertsResponse> {
        let url = format!("{}/environment/flood-alerts", self.api.data_gov_url);
        self.get_json(self.data_gov_get(&url), &url).await
    }

    async fn realtime_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}/{path}", self.api.realtime_url);
        let resp: RealtimeResponse<T> = self.get_json(self.data_gov_get(&url), &url).await?;
        resp.into_data()
    }

    fn data_gov_get(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.http.get(url);
        match &self.api.data_gov_api_key {
            Some(key) => request.header("X-API-Key", key),
            None => request,
        }
    }

    /// Every record of a DataMall dataset, following `$skip` pagination.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] without an account key, or any
    /// error from an individual page.
    pub async fn datamall<T: DeserializeOwned>(&self, dataset: &str) -> Result<Vec<T>> {
        let key = self
            .api
            .lta_account_key
            .as_deref()
            .ok_or(Error::MissingCredential("lta_account_key"))?;
        let url = format!("{}/{dataset}", self.api.datamall_url);
        let url = url.as_str();

        let records = paginate(DATAMALL_MAX_PAGES, move |skip| {
            self.datamall_page::<T>(url, key, skip)
        })
        .await?;

        info!("Fetched {} records from DataMall {dataset}", records.len());
        Ok(records)
    }

    async fn datamall_page<T: DeserializeOwned>(
        &self,
        url: &str,
        key: &str,
        skip: usize,
    ) -> Result<Vec<T>> {
        let request = self
            .http
            .get(url)
            .header("AccountKey", key)
            .query(&[("$skip", skip)]);
        let page: DataMallPage<T> = self.get_json(request, url).await?;
        Ok(page.value)
    }

    /// Ask Data.gov.sg for a signed download URL of a dataset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] when the API refuses or omits the URL.
    pub async fn initiate_download(&self, dataset_id: &str) -> Result<String> {
        let url = format!(
            "{}/{dataset_id}/initiate-download",
            self.api.datasets_url
        );
        debug!("Initiating download for dataset {dataset_id}");
        let resp: InitiateDownloadResponse = self.get_json(self.http.get(&url), &url).await?;
        resp.into_url()
    }

    /// Fetch raw bytes from a URL, typically a signed dataset or image URL.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or non-2xx status.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?;
        let response = check_status(response, url)?;
        let body = response.bytes().await?;
        debug!("Downloaded {} bytes", body.len());
        Ok(body.to_vec())
    }

    /// Exchange OneMap account credentials for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] when email or password is unset.
    pub async fn onemap_token(&self) -> Result<OneMapToken> {
        #[derive(Serialize)]
        struct Credentials<'a> {
            email: &'a str,
            password: &'a str,
        }

        let email = self
            .api
            .onemap_email
            .as_deref()
            .ok_or(Error::MissingCredential("onemap_email"))?;
        let password = self
            .api
            .onemap_password
            .as_deref()
            .ok_or(Error::MissingCredential("onemap_password"))?;

        let url = format!("{}/api/auth/post/getToken", self.api.onemap_url);
        let request = self
            .http
            .post(&url)
            .json(&Credentials { email, password });
        self.get_json(request, &url).await
    }

    /// Geocode a free-text place name with OneMap.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or a bad body.
    pub async fn onemap_search(&self, query: &str, token: &str) -> Result<OneMapSearchResponse> {
        let url = format!("{}/api/common/elastic/search", self.api.onemap_url);
        let request = self
            .http
            .get(&url)
            .header("Authorization", token)
            .query(&[
                ("searchVal", query),
                ("returnGeom", "Y"),
                ("getAddrDetails", "Y"),
                ("pageNum", "1"),
            ]);
        self.get_json(request, &url).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<T> {
        let response = request.send().await?;
        let response = check_status(response, url)?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Collect `$skip`-style pages until one comes back short.
///
/// `fetch_page` receives the number of records collected so far. A page
/// with fewer than [`DATAMALL_PAGE_SIZE`] records, empty included, ends the
/// dataset.
///
/// # Errors
///
/// Returns the first page error, or [`Error::Upstream`] when `max_pages`
/// full pages have been read without reaching the end.
pub async fn paginate<T, F, Fut>(max_pages: usize, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut records = Vec::new();
    for page in 1..=max_pages {
        let batch = fetch_page(records.len()).await?;
        let fetched = batch.len();
        records.extend(batch);
        debug!(page, fetched, total = records.len(), "Fetched page");

        if fetched < DATAMALL_PAGE_SIZE {
            return Ok(records);
        }
    }
    Err(Error::upstream(format!(
        "still receiving full pages after {max_pages} requests ({} records)",
        records.len()
    )))
}

fn check_status(response: reqwest::Response, url: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

impl<T> RealtimeResponse<T> {
    /// Unwrap the payload, turning an API-level failure into an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] for a non-zero code or a missing payload.
    pub fn into_data(self) -> Result<T> {
        if self.code != 0 {
            return Err(Error::upstream(
                self.error_msg
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| format!("realtime API returned code {}", self.code)),
            ));
        }
        self.data
            .ok_or_else(|| Error::upstream("realtime API returned no data"))
    }
}

impl InitiateDownloadResponse {
    /// Extract the signed URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] for a non-zero code or a missing URL.
    pub fn into_url(self) -> Result<String> {
        if self.code != 0 {
            return Err(Error::upstream(
                self.error_msg
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }
        self.data
            .and_then(|d| d.url)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::upstream("no download URL in initiate-download response"))
    }
}
