use crate::error::{ApiError, ApiResult};
use crate::flatten::flatten_into;
use crate::freshness::{Freshness, NotModified};
use crate::normalize::{RecordPlan, normalize, normalize_with_plan};
use crate::query::{
    AwardsQuery, Detail, DistrictsQuery, EventsQuery, MatchesQuery, TeamDetail, TeamsQuery,
    team_descriptor,
};
use crate::response::{Fetched, Frame, RawResponse, attach};
use crate::session::{DataFormat, Session};
use crate::shape::{self, DistrictPointTables, PredictionTables};
use crate::table::{FromScalars, Table};
use chrono::Utc;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::collections::BTreeMap;

const AUTH_HEADER: &str = "X-TBA-Auth-Key";

/// Blocking client for The Blue Alliance read API (v3).
///
/// Every endpoint method returns a [`Fetched`]: the shaped payload with the response
/// metadata on a 200, the synthetic not-modified table on a 304, and the untouched response
/// otherwise or when the session asks for JSON/XML text.
#[derive(Debug, Clone)]
pub struct TbaClient {
    client: Client,
    session: Session,
}

impl TbaClient {
    pub fn new(session: Session) -> ApiResult<Self> {
        let client = Client::builder()
            .user_agent(session.user_agent())
            .timeout(session.timeout())
            .build()
            .map_err(|e| ApiError::Network(e, session.base_url().to_owned()))?;
        Ok(Self { client, session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Performs one GET for `descriptor` and captures the reply.
    ///
    /// The body is kept on 200 and as `error_body` on other statuses. On 304 the
    /// conditional header that was sent is copied into the captured headers so the reply
    /// can be attributed later.
    pub fn send(&self, descriptor: &[String], freshness: &Freshness) -> ApiResult<RawResponse> {
        let url = self.session.url_for(descriptor);
        let mut request = self
            .client
            .get(&url)
            .header(AUTH_HEADER, self.session.auth_key())
            .header(ACCEPT, self.session.format().accept_header());
        for (name, value) in freshness.headers() {
            request = request.header(name, value);
        }

        log::debug!("GET {url}");
        let response = request
            .send()
            .map_err(|e| ApiError::Network(e, url.clone()))?;

        let status_code = response.status().as_u16();
        let mut headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();

        let (body, error_body) = match status_code {
            304 => {
                for (name, value) in freshness.headers() {
                    headers.insert(name.to_owned(), value);
                }
                (None, None)
            }
            status => {
                let text = response
                    .text()
                    .map_err(|e| ApiError::Network(e, url.clone()))?;
                if status == 200 {
                    (Some(text), None)
                } else {
                    (None, Some(text).filter(|t| !t.trim().is_empty()))
                }
            }
        };
        log::debug!("{url} answered {status_code}");

        Ok(RawResponse {
            status_code,
            body,
            error_body,
            headers,
            url,
            fetched_at: Utc::now(),
            request_descriptor: descriptor.to_vec(),
        })
    }

    fn fetch<T>(
        &self,
        descriptor: Vec<String>,
        freshness: &Freshness,
        shaper: impl FnOnce(&Value) -> ApiResult<T>,
    ) -> ApiResult<Fetched<T>> {
        let response = self.send(&descriptor, freshness)?;
        if self.session.format() != DataFormat::Table {
            return Ok(Fetched::Raw(response));
        }

        match response.status_code {
            200 => {
                let text = response.body.as_deref().unwrap_or_default();
                let doc: Value = serde_json::from_str(text)
                    .map_err(|e| ApiError::Parsing(e, response.url.clone()))?;
                let data = shaper(&doc)?;
                Ok(Fetched::Shaped(attach(data, &response)))
            }
            304 => {
                let not_modified = NotModified::from_response(&response)?;
                log::debug!(
                    "{} not modified since {}",
                    response.url,
                    not_modified.timestamp
                );
                Ok(Fetched::NotModified(attach(not_modified.to_table(), &response)))
            }
            status => {
                log::warn!(
                    "{} answered {status}, returning the raw response",
                    response.url
                );
                Ok(Fetched::Raw(response))
            }
        }
    }

    fn fetch_table(
        &self,
        descriptor: Vec<String>,
        freshness: &Freshness,
    ) -> ApiResult<Fetched<Table>> {
        self.fetch(descriptor, freshness, normalize)
    }

    fn fetch_listing(
        &self,
        descriptor: Vec<String>,
        detail: Detail,
        freshness: &Freshness,
    ) -> ApiResult<Fetched<Table>> {
        match detail {
            Detail::Keys => self.fetch(descriptor, freshness, shape::keys),
            Detail::Full | Detail::Simple => self.fetch_table(descriptor, freshness),
        }
    }

    /// API status, flattened to label/value pairs.
    pub fn status<T: FromScalars>(&self, freshness: &Freshness) -> ApiResult<Fetched<T>> {
        self.fetch(vec!["status".to_owned()], freshness, |doc| {
            Ok(flatten_into(doc))
        })
    }

    pub fn teams(&self, query: &TeamsQuery, freshness: &Freshness) -> ApiResult<Fetched<Table>> {
        self.fetch_listing(query.descriptor()?, query.detail, freshness)
    }

    /// Every team, optionally limited to one season, by requesting pages 0, 1, 2, ...
    /// until an empty page comes back.
    ///
    /// The result carries the metadata of the first page. A page that is not modified or
    /// not shaped ends the walk and is returned as is.
    pub fn all_teams(
        &self,
        year: Option<u16>,
        detail: Detail,
        freshness: &Freshness,
    ) -> ApiResult<Fetched<Table>> {
        let query = |page| TeamsQuery { page: Some(page), year, detail, ..TeamsQuery::default() };
        let (mut table, meta) = match self.teams(&query(0), freshness)? {
            Fetched::Shaped(frame) => frame.into_parts(),
            other => return Ok(other),
        };

        let mut pages = Vec::new();
        let mut page = 0;
        while !table.is_empty() {
            pages.push(table);
            page += 1;
            table = match self.teams(&query(page), freshness)? {
                Fetched::Shaped(frame) => frame.into_parts().0,
                other => return Ok(other),
            };
        }
        log::debug!("team listing ends before page {page}");
        Ok(Fetched::Shaped(Frame::from_parts(Table::concat(pages), meta)))
    }

    pub fn team(
        &self,
        team: &str,
        detail: TeamDetail,
        freshness: &Freshness,
    ) -> ApiResult<Fetched<Table>> {
        let descriptor = team_descriptor(team, detail);
        match detail {
            TeamDetail::YearsParticipated => {
                self.fetch(descriptor, freshness, |doc| shape::single_column(doc, "year"))
            }
            _ => self.fetch_table(descriptor, freshness),
        }
    }

    pub fn events(&self, query: &EventsQuery, freshness: &Freshness) -> ApiResult<Fetched<Table>> {
        self.fetch_listing(query.descriptor()?, query.detail, freshness)
    }

    /// District rankings, one row per team per counted event.
    pub fn district_rankings(
        &self,
        district: &str,
        freshness: &Freshness,
    ) -> ApiResult<Fetched<Table>> {
        let plan = RecordPlan::new(
            "event_points",
            &["rank", "team_key", "point_total", "rookie_bonus"],
        );
        self.fetch(path(&["district", district, "rankings"]), freshness, |doc| {
            normalize_with_plan(doc, &plan)
        })
    }

    pub fn matches(&self, query: &MatchesQuery, freshness: &Freshness) -> ApiResult<Fetched<Table>> {
        let descriptor = query.descriptor()?;
        let zone = self.session.zone();
        match query.detail {
            Detail::Keys => self.fetch(descriptor, freshness, shape::keys),
            Detail::Full | Detail::Simple => {
                self.fetch(descriptor, freshness, |doc| shape::matches(doc, zone))
            }
        }
    }

    pub fn districts(
        &self,
        query: &DistrictsQuery,
        freshness: &Freshness,
    ) -> ApiResult<Fetched<Table>> {
        self.fetch_table(query.descriptor()?, freshness)
    }

    pub fn awards(&self, query: &AwardsQuery, freshness: &Freshness) -> ApiResult<Fetched<Table>> {
        self.fetch_table(query.descriptor()?, freshness)
    }

    pub fn alliances(&self, event: &str, freshness: &Freshness) -> ApiResult<Fetched<Table>> {
        self.fetch(path(&["event", event, "alliances"]), freshness, shape::alliances)
    }

    pub fn insights(&self, event: &str, freshness: &Freshness) -> ApiResult<Fetched<Table>> {
        self.fetch(path(&["event", event, "insights"]), freshness, shape::insights)
    }

    pub fn oprs(&self, event: &str, freshness: &Freshness) -> ApiResult<Fetched<Table>> {
        self.fetch(path(&["event", event, "oprs"]), freshness, shape::oprs)
    }

    pub fn predictions(
        &self,
        event: &str,
        freshness: &Freshness,
    ) -> ApiResult<Fetched<PredictionTables>> {
        self.fetch(path(&["event", event, "predictions"]), freshness, shape::predictions)
    }

    pub fn event_rankings(&self, event: &str, freshness: &Freshness) -> ApiResult<Fetched<Table>> {
        self.fetch(path(&["event", event, "rankings"]), freshness, shape::event_rankings)
    }

    pub fn district_points(
        &self,
        event: &str,
        freshness: &Freshness,
    ) -> ApiResult<Fetched<DistrictPointTables>> {
        self.fetch(
            path(&["event", event, "district_points"]),
            freshness,
            shape::district_points,
        )
    }

    /// A team's status at one event as label/value pairs.
    pub fn event_team_status<T: FromScalars>(
        &self,
        event: &str,
        team: &str,
        freshness: &Freshness,
    ) -> ApiResult<Fetched<T>> {
        self.fetch(
            path(&["team", team, "event", event, "status"]),
            freshness,
            |doc| Ok(shape::event_team_status(doc)),
        )
    }

    pub fn media(&self, team: &str, year: u16, freshness: &Freshness) -> ApiResult<Fetched<Table>> {
        let year = year.to_string();
        self.fetch_table(path(&["team", team, "media", year.as_str()]), freshness)
    }

    pub fn social_media(&self, team: &str, freshness: &Freshness) -> ApiResult<Fetched<Table>> {
        self.fetch_table(path(&["team", team, "social_media"]), freshness)
    }

    /// Any other endpoint, shaped by the generic normalizer.
    pub fn generic(&self, descriptor: &[&str], freshness: &Freshness) -> ApiResult<Fetched<Table>> {
        self.fetch_table(path(descriptor), freshness)
    }
}

fn path(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| (*p).to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Scalar, Series};
    use mockito::{Matcher, Server, ServerGuard};

    const STAMP: &str = "Wed, 30 Aug 2017 06:49:32 GMT";

    fn client(server: &ServerGuard, format: DataFormat) -> TbaClient {
        let session = Session::new("secret")
            .with_base_url(server.url())
            .with_format(format);
        TbaClient::new(session).unwrap()
    }

    #[test]
    fn shaped_table_carries_response_metadata() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/event/2017wasno/teams/simple")
            .match_header("x-tba-auth-key", "secret")
            .match_header("accept", "application/json")
            .match_header("if-modified-since", Matcher::Missing)
            .with_status(200)
            .with_header("Last-Modified", STAMP)
            .with_body(r#"[{"key":"frc1","team_number":1},{"key":"frc2","team_number":2,"nickname":"B"}]"#)
            .create();

        let query = TeamsQuery {
            event: Some("2017wasno".into()),
            detail: Detail::Simple,
            ..Default::default()
        };
        let frame = client(&server, DataFormat::Table)
            .teams(&query, &Freshness::always())
            .unwrap()
            .shaped()
            .unwrap();
        mock.assert();

        assert_eq!(frame.data().columns(), ["key", "team_number", "nickname"]);
        assert!(frame.data().value(0, "nickname").is_null());
        let meta = frame.metadata();
        assert_eq!(meta.status_code, 200);
        assert_eq!(meta.last_modified(), Some(STAMP));
        assert_eq!(meta.request_descriptor, ["event", "2017wasno", "teams", "simple"]);
        assert!(meta.url.ends_with("/event/2017wasno/teams/simple"));
    }

    #[test]
    fn not_modified_reply_becomes_a_one_row_table() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/districts/2017")
            .match_header("if-modified-since", STAMP)
            .with_status(304)
            .create();

        let freshness = Freshness::modified_since(STAMP).unwrap();
        let query = DistrictsQuery { year: Some(2017), team: None };
        let fetched = client(&server, DataFormat::Table)
            .districts(&query, &freshness)
            .unwrap();
        mock.assert();

        let Fetched::NotModified(frame) = fetched else {
            panic!("expected a not-modified result");
        };
        assert_eq!(frame.data().columns(), ["If-Modified-Since"]);
        assert_eq!(frame.data().value(0, "If-Modified-Since"), &Scalar::from(STAMP));
        assert_eq!(frame.metadata().status_code, 304);
    }

    #[test]
    fn only_modified_since_sends_the_filter_header() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/team/frc1318/awards")
            .match_header("fms-onlymodifiedsince", STAMP)
            .with_status(200)
            .with_body("[]")
            .create();

        let freshness = Freshness::only_modified_since(STAMP).unwrap();
        let query = AwardsQuery { team: Some("frc1318".into()), ..Default::default() };
        let frame = client(&server, DataFormat::Table)
            .awards(&query, &freshness)
            .unwrap()
            .shaped()
            .unwrap();
        mock.assert();
        assert!(frame.data().is_empty());
    }

    #[test]
    fn unexpected_status_passes_the_response_through() {
        let mut server = Server::new();
        server
            .mock("GET", "/team/frc0")
            .with_status(404)
            .with_body(r#"{"Errors":[{"team_id":"frc0 does not exist"}]}"#)
            .create();

        let fetched = client(&server, DataFormat::Table)
            .team("frc0", TeamDetail::Full, &Freshness::always())
            .unwrap();
        let Fetched::Raw(raw) = fetched else {
            panic!("expected the raw response");
        };
        assert_eq!(raw.status_code, 404);
        assert!(raw.body.is_none());
        assert!(raw.error_body.as_deref().unwrap().contains("frc0 does not exist"));
    }

    #[test]
    fn text_formats_skip_shaping() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/team/frc1318")
            .match_header("accept", "application/xml")
            .with_status(200)
            .with_body("<team><key>frc1318</key></team>")
            .create();

        let fetched = client(&server, DataFormat::Xml)
            .team("frc1318", TeamDetail::Full, &Freshness::always())
            .unwrap();
        mock.assert();
        let Fetched::Raw(raw) = fetched else {
            panic!("expected the raw response");
        };
        assert_eq!(raw.body.as_deref(), Some("<team><key>frc1318</key></team>"));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let mut server = Server::new();
        server
            .mock("GET", "/event/2017wasno/oprs")
            .with_status(200)
            .with_body("{not json")
            .create();

        let result = client(&server, DataFormat::Table).oprs("2017wasno", &Freshness::always());
        assert!(matches!(result, Err(ApiError::Parsing(_, url)) if url.ends_with("/oprs")));
    }

    #[test]
    fn invalid_arguments_fail_before_any_request() {
        let server = Server::new();
        let result = client(&server, DataFormat::Table)
            .matches(&MatchesQuery::default(), &Freshness::always());
        assert!(matches!(result, Err(ApiError::Configuration(_))));
    }

    #[test]
    fn all_teams_walks_pages_until_empty() {
        let mut server = Server::new();
        let page0 = server
            .mock("GET", "/teams/2017/0/keys")
            .with_status(200)
            .with_body(r#"["frc1","frc2"]"#)
            .create();
        let page1 = server
            .mock("GET", "/teams/2017/1/keys")
            .with_status(200)
            .with_body(r#"["frc3"]"#)
            .create();
        let page2 = server
            .mock("GET", "/teams/2017/2/keys")
            .with_status(200)
            .with_body("[]")
            .create();

        let frame = client(&server, DataFormat::Table)
            .all_teams(Some(2017), Detail::Keys, &Freshness::always())
            .unwrap()
            .shaped()
            .unwrap();
        page0.assert();
        page1.assert();
        page2.assert();

        assert_eq!(frame.data().len(), 3);
        assert_eq!(frame.data().value(2, "key"), &Scalar::from("frc3"));
        assert_eq!(frame.metadata().request_descriptor, ["teams", "2017", "0", "keys"]);
    }

    #[test]
    fn matches_are_localized_in_the_session_zone() {
        let mut server = Server::new();
        server
            .mock("GET", "/match/2017wasno_qm1")
            .with_status(200)
            .with_body(
                r#"{"key":"2017wasno_qm1","comp_level":"qm","time":1491062400,
                    "alliances":{"blue":{"score":1,"team_keys":["frc1"]},
                                 "red":{"score":2,"team_keys":["frc2"]}}}"#,
            )
            .create();

        let session = Session::new("secret")
            .with_base_url(server.url())
            .with_zone("America/Los_Angeles".parse().unwrap());
        let query = MatchesQuery { match_key: Some("2017wasno_qm1".into()), ..Default::default() };
        let frame = TbaClient::new(session)
            .unwrap()
            .matches(&query, &Freshness::always())
            .unwrap()
            .shaped()
            .unwrap();
        assert_eq!(frame.data().len(), 2);
        assert_eq!(frame.data().value(0, "time"), &Scalar::from("2017-04-01 09:00:00"));
    }

    #[test]
    fn district_rankings_expand_event_points() {
        let mut server = Server::new();
        server
            .mock("GET", "/district/2017pnw/rankings")
            .with_status(200)
            .with_body(
                r#"[{"rank":1,"team_key":"frc2910","point_total":180,"rookie_bonus":0,
                     "event_points":[{"event_key":"2017wasno","total":73},
                                     {"event_key":"2017waamv","total":72}]}]"#,
            )
            .create();

        let table = client(&server, DataFormat::Table)
            .district_rankings("2017pnw", &Freshness::always())
            .unwrap()
            .shaped()
            .unwrap()
            .into_parts()
            .0;
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(1, "event_key"), &Scalar::from("2017waamv"));
        assert_eq!(table.value(1, "team_key"), &Scalar::from("frc2910"));
        assert_eq!(table.value(0, "point_total"), &Scalar::from(180i64));
    }

    #[test]
    fn status_flattens_to_a_series() {
        let mut server = Server::new();
        server
            .mock("GET", "/status")
            .with_status(200)
            .with_body(r#"{"current_season":2017,"android":{"min_app_version":4,"latest_app_version":5}}"#)
            .create();

        let series: Series = client(&server, DataFormat::Table)
            .status(&Freshness::always())
            .unwrap()
            .shaped()
            .unwrap()
            .into_parts()
            .0;
        assert_eq!(series.get("current_season"), Some(&Scalar::from(2017i64)));
        assert_eq!(series.get("android_latest_app_version"), Some(&Scalar::from(5i64)));
    }

    #[test]
    fn status_honours_the_freshness_condition() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/status")
            .match_header("if-modified-since", STAMP)
            .with_status(304)
            .create();

        let freshness = Freshness::modified_since(STAMP).unwrap();
        let fetched = client(&server, DataFormat::Table)
            .status::<Series>(&freshness)
            .unwrap();
        mock.assert();
        let Fetched::NotModified(frame) = fetched else {
            panic!("expected a not-modified result");
        };
        assert_eq!(frame.data().value(0, "If-Modified-Since"), &Scalar::from(STAMP));
    }
}
