//! Matrix Gateway
//!
//! `RoomGateway` over the Matrix client-server API (v3), using reqwest.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::types::{
    decode_events, EventContextResponse, MatrixErrorBody, MembersResponse, PaginationChunk,
    PublicRoomsResponse, RoomInitialSyncResponse,
};
use crate::config::MatrixSettings;
use crate::domain::{
    Event, GatewayError, MemberInfo, NewEvents, PublicRoomEntry, RoomGateway, RoomStateSnapshot,
};
use crate::infrastructure::metrics;

/// Build the shared HTTP client for homeserver requests.
pub fn build_http_client(settings: &MatrixSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Gateway to a single Matrix homeserver.
#[derive(Debug, Clone)]
pub struct MatrixGateway {
    http: Client,
    base: Url,
    access_token: Option<String>,
    initial_timeline_limit: usize,
    forward_sync_limit: usize,
    directory_limit: usize,
}

impl MatrixGateway {
    pub fn new(settings: &MatrixSettings) -> Result<Self, GatewayError> {
        let base = Url::parse(&settings.homeserver_url)
            .map_err(|e| GatewayError::Decode(format!("invalid homeserver URL: {e}")))?;
        let http = build_http_client(settings).map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base,
            access_token: settings.access_token.clone().filter(|t| !t.is_empty()),
            initial_timeline_limit: settings.initial_timeline_limit,
            forward_sync_limit: settings.forward_sync_limit,
            directory_limit: settings.directory_limit,
        })
    }

    /// `{homeserver}/_matrix/client/v3/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Decode("homeserver URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["_matrix", "client", "v3"])
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: Url,
    ) -> Result<T, GatewayError> {
        let started = Instant::now();
        let result = self.send(url).await;
        metrics::record_gateway_request(operation, result.is_ok(), started.elapsed().as_secs_f64());
        result
    }

    async fn send<T: DeserializeOwned>(&self, url: Url) -> Result<T, GatewayError> {
        debug!(%url, "Homeserver request");
        let mut request = self.http.get(url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body: MatrixErrorBody = response.json().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                errcode: body.errcode,
                message: body.error,
            });
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                GatewayError::Decode(e.to_string())
            } else {
                GatewayError::Network(e.to_string())
            }
        })
    }
}

#[async_trait]
impl RoomGateway for MatrixGateway {
    #[instrument(skip(self))]
    async fn fetch_room_state(&self, room_id: &str) -> Result<RoomStateSnapshot, GatewayError> {
        let mut url = self.endpoint(&["rooms", room_id, "initialSync"])?;
        url.query_pairs_mut()
            .append_pair("limit", &self.initial_timeline_limit.to_string());

        let response: RoomInitialSyncResponse = self.get_json("fetch_room_state", url).await?;
        Ok(RoomStateSnapshot {
            state: decode_events(response.state),
            timeline: decode_events(response.messages.chunk),
            cursor: response.messages.end.unwrap_or_default(),
        })
    }

    #[instrument(skip(self))]
    async fn fetch_timeline_page(
        &self,
        room_id: &str,
        before_event_id: &str,
        count: usize,
    ) -> Result<Vec<Event>, GatewayError> {
        // The context limit is split between events before and after the
        // target, so ask for twice as many.
        let mut url = self.endpoint(&["rooms", room_id, "context", before_event_id])?;
        url.query_pairs_mut()
            .append_pair("limit", &count.saturating_mul(2).to_string());

        let response: EventContextResponse = self.get_json("fetch_timeline_page", url).await?;
        let mut events = decode_events(response.events_before);
        events.truncate(count);
        Ok(events)
    }

    #[instrument(skip(self))]
    async fn fetch_members(&self, room_id: &str) -> Result<Vec<MemberInfo>, GatewayError> {
        let url = self.endpoint(&["rooms", room_id, "members"])?;
        let response: MembersResponse = self.get_json("fetch_members", url).await?;

        Ok(decode_events(response.chunk)
            .iter()
            .filter_map(MemberInfo::from_event)
            .collect())
    }

    #[instrument(skip(self))]
    async fn fetch_public_directory(&self) -> Result<Vec<PublicRoomEntry>, GatewayError> {
        let mut entries: Vec<PublicRoomEntry> = Vec::new();
        let mut since: Option<String> = None;

        loop {
            let mut url = self.endpoint(&["publicRooms"])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("limit", &self.directory_limit.to_string());
                if let Some(since) = &since {
                    query.append_pair("since", since);
                }
            }

            let response: PublicRoomsResponse =
                self.get_json("fetch_public_directory", url).await?;
            let page_len = response.chunk.len();
            entries.extend(response.chunk);

            match response.next_batch {
                Some(next) if page_len > 0
                    && entries.len() < self.directory_limit
                    && since.as_deref() != Some(next.as_str()) =>
                {
                    since = Some(next);
                }
                _ => break,
            }
        }

        entries.truncate(self.directory_limit);
        Ok(entries)
    }

    #[instrument(skip(self))]
    async fn fetch_new_events_since(
        &self,
        room_id: &str,
        cursor: &str,
    ) -> Result<NewEvents, GatewayError> {
        let mut url = self.endpoint(&["rooms", room_id, "messages"])?;
        url.query_pairs_mut()
            .append_pair("from", cursor)
            .append_pair("dir", "f")
            .append_pair("limit", &self.forward_sync_limit.to_string());

        let response: PaginationChunk = self.get_json("fetch_new_events_since", url).await?;
        Ok(NewEvents {
            events: decode_events(response.chunk),
            cursor: response.end.unwrap_or_default(),
        })
    }
}
