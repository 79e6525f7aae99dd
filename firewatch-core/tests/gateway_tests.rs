// Tests for the active fires gateway against mocked FIRMS and Nominatim servers

use chrono::NaiveDate;
use firewatch_core::error::{ErrorKind, GatewayError};
use firewatch_core::gateway::*;
use firewatch_upstream::{FirmsArea, FirmsClient, FirmsSource, MapKey, NominatimClient};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, path_regex, query_param},
};

const KEY: &str = "0123456789abcdef0123456789abcdef";

// L-shaped Vietnam stand-in, bbox 100..110 E, 10..20 N with the north-east quarter outside
const VIETNAM: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "bbox": [100.0, 10.0, 110.0, 20.0],
        "properties": {
            "display_name": "Việt Nam",
            "name": "Việt Nam",
            "namedetails": {"name": "Việt Nam", "name:en": "Vietnam"},
            "address": {"country": "Việt Nam", "country_code": "vn"}
        },
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[100.0, 10.0], [110.0, 10.0], [110.0, 15.0], [105.0, 15.0], [105.0, 20.0], [100.0, 20.0], [100.0, 10.0]]]
        }
    }]
}"#;

const EMPTY: &str = r#"{"type": "FeatureCollection", "features": []}"#;

const VIIRS_HEADER: &str = "latitude,longitude,bright_ti4,scan,track,acq_date,acq_time,satellite,instrument,confidence,version,bright_ti5,frp,daynight";
const MODIS_HEADER: &str = "latitude,longitude,brightness,scan,track,acq_date,acq_time,satellite,instrument,confidence,version,bright_t31,frp,daynight";

// inside, outside the outline, low confidence
const SNPP_ROWS: [&str; 3] = [
    "12.0,102.0,331.2,0.39,0.36,2024-03-02,612,N,VIIRS,h,2.0NRT,292.1,4.5,D",
    "18.0,108.0,340.0,0.39,0.36,2024-03-03,130,N,VIIRS,h,2.0NRT,292.1,7.5,N",
    "12.5,108.5,301.0,0.39,0.36,2024-03-03,1805,N,VIIRS,l,2.0NRT,290.0,1.1,N",
];

// the same detection as the first SNPP row
const NOAA20_ROWS: [&str; 1] = [
    "12.0,102.0,331.2,0.39,0.36,2024-03-02,612,N,VIIRS,h,2.0NRT,292.1,4.5,D",
];

const MODIS_ROWS: [&str; 1] = [
    "18.0,102.0,320.5,1.0,1.0,2024-03-01,335,Terra,MODIS,85,6.1NRT,298.0,22.4,D",
];

fn csv(header: &str, rows: &[&str]) -> String {
    let mut body = String::from(header);
    for row in rows {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');
    body
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()
}

fn key() -> MapKey {
    MapKey::parse(KEY).unwrap()
}

fn gateway(firms_url: &str, nominatim_url: &str) -> FireGateway {
    let firms = FirmsClient::with_timeout(firms_url, key(), 5).unwrap();
    let nominatim = NominatimClient::with_options(nominatim_url, "firewatch-test", 0.005, 5).unwrap();
    FireGateway::new(firms, nominatim, QueryDefaults::default())
}

fn request(country: &str, days: u8) -> ActiveFiresRequest {
    ActiveFiresRequest {
        country: country.to_string(),
        days,
        sources: vec![
            FirmsSource::ViirsSnppNrt,
            FirmsSource::ViirsNoaa20Nrt,
            FirmsSource::ModisNrt,
        ],
        include_low: false,
        date: None,
    }
}

async fn mock_vietnam(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Vietnam"))
        .and(query_param("featureType", "country"))
        .and(query_param("polygon_geojson", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(VIETNAM))
        .mount(server)
        .await;
}

async fn mock_firms(server: &MockServer, days: u8) {
    let area = "100.0000,10.0000,110.0000,20.0000";
    for (source, body) in [
        ("VIIRS_SNPP_NRT", csv(VIIRS_HEADER, &SNPP_ROWS)),
        ("VIIRS_NOAA20_NRT", csv(VIIRS_HEADER, &NOAA20_ROWS)),
        ("MODIS_NRT", csv(MODIS_HEADER, &MODIS_ROWS)),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/api/area/csv/{}/{}/{}/{}", KEY, source, area, days)))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(server)
            .await;
    }
}

// ============================================================================
// End To End Tests
// ============================================================================

#[tokio::test]
async fn test_active_fires_vietnam() {
    let nominatim = MockServer::start().await;
    let firms = MockServer::start().await;
    mock_vietnam(&nominatim).await;
    mock_firms(&firms, 5).await;

    let gateway = gateway(&firms.uri(), &nominatim.uri());
    let fires = gateway
        .active_fires_at(&request("Vietnam", 5), today())
        .await
        .unwrap();

    assert_eq!(fires.country.name, "Vietnam");
    assert_eq!(fires.country.display_name, "Việt Nam");
    assert_eq!(fires.country.country_code.as_deref(), Some("VN"));
    assert!(matches!(fires.boundary.value, geojson::Value::Polygon(_)));
    assert_eq!(fires.days, 5);
    assert!(!fires.include_low_confidence);

    // outside point and low confidence dropped, duplicate collapsed
    assert_eq!(fires.fires.len(), 2);
    assert_eq!(fires.high_confidence_count(), 2);

    let first = &fires.fires[0];
    assert_eq!(first.source, FirmsSource::ModisNrt);
    assert_eq!(first.days_ago, 2);

    let second = &fires.fires[1];
    assert_eq!((second.lat, second.lon), (12.0, 102.0));
    assert_eq!(second.source, FirmsSource::ViirsNoaa20Nrt);
    assert_eq!(second.days_ago, 1);
}

#[tokio::test]
async fn test_active_fires_include_low() {
    let nominatim = MockServer::start().await;
    let firms = MockServer::start().await;
    mock_vietnam(&nominatim).await;
    mock_firms(&firms, 5).await;

    let gateway = gateway(&firms.uri(), &nominatim.uri());
    let mut req = request("Vietnam", 5);
    req.include_low = true;
    let fires = gateway.active_fires_at(&req, today()).await.unwrap();

    assert_eq!(fires.fires.len(), 3);
    assert_eq!(fires.high_confidence_count(), 2);
    // the newest detection is from today
    let ages: Vec<u32> = fires.fires.iter().map(|f| f.days_ago).collect();
    assert_eq!(ages, vec![2, 1, 0]);
}

#[tokio::test]
async fn test_active_fires_coordinates_in_range() {
    let nominatim = MockServer::start().await;
    let firms = MockServer::start().await;
    mock_vietnam(&nominatim).await;

    let rows = [
        "12.0,102.0,331.2,0.39,0.36,2024-03-02,612,N,VIIRS,h,2.0NRT,292.1,4.5,D",
        "95.0,102.0,331.2,0.39,0.36,2024-03-02,612,N,VIIRS,h,2.0NRT,292.1,4.5,D",
        "12.0,190.0,331.2,0.39,0.36,2024-03-02,612,N,VIIRS,h,2.0NRT,292.1,4.5,D",
    ];
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/area/csv/[0-9a-f]{32}/VIIRS_SNPP_NRT/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(csv(VIIRS_HEADER, &rows)))
        .mount(&firms)
        .await;

    let gateway = gateway(&firms.uri(), &nominatim.uri());
    let mut req = request("Vietnam", 3);
    req.sources = vec![FirmsSource::ViirsSnppNrt];
    let fires = gateway.active_fires_at(&req, today()).await.unwrap();

    assert_eq!(fires.fires.len(), 1);
    for fire in &fires.fires {
        assert!((-90.0..=90.0).contains(&fire.lat));
        assert!((-180.0..=180.0).contains(&fire.lon));
    }
}

#[tokio::test]
async fn test_active_fires_empty_fires_is_success() {
    let nominatim = MockServer::start().await;
    let firms = MockServer::start().await;
    mock_vietnam(&nominatim).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/area/csv/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{}\n", VIIRS_HEADER)))
        .mount(&firms)
        .await;

    let gateway = gateway(&firms.uri(), &nominatim.uri());
    let fires = gateway
        .active_fires_at(&request("Vietnam", 5), today())
        .await
        .unwrap();

    assert!(fires.fires.is_empty());
    assert_eq!(fires.to_feature_collection().features.len(), 1);
}

// ============================================================================
// Validation Tests
// ============================================================================

#[tokio::test]
async fn test_invalid_day_range_makes_no_upstream_calls() {
    let nominatim = MockServer::start().await;
    let firms = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(VIETNAM))
        .expect(0)
        .mount(&nominatim)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&firms)
        .await;

    let gateway = gateway(&firms.uri(), &nominatim.uri());
    for days in [0, 11] {
        let err = gateway
            .active_fires_at(&request("Vietnam", days), today())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }
}

#[test]
fn test_params_defaults() {
    let params = ActiveFiresParams {
        country: Some("  Vietnam ".to_string()),
        ..Default::default()
    };
    let req = params.validate(&QueryDefaults::default()).unwrap();

    assert_eq!(req.country, "Vietnam");
    assert_eq!(req.days, 9);
    assert_eq!(req.sources, FirmsSource::DEFAULTS.to_vec());
    assert!(!req.include_low);
    assert_eq!(req.date, None);
}

#[test]
fn test_params_explicit_values() {
    let params = ActiveFiresParams {
        country: Some("VN".to_string()),
        days: Some("5".to_string()),
        sources: Some("modis_nrt, VIIRS_NOAA21_NRT,MODIS_NRT".to_string()),
        include_low: Some("on".to_string()),
        date: Some("2024-03-01".to_string()),
    };
    let req = params.validate(&QueryDefaults::default()).unwrap();

    assert_eq!(req.days, 5);
    assert_eq!(
        req.sources,
        vec![FirmsSource::ModisNrt, FirmsSource::ViirsNoaa21Nrt]
    );
    assert!(req.include_low);
    assert_eq!(req.date, NaiveDate::from_ymd_opt(2024, 3, 1));
}

#[test]
fn test_params_rejections() {
    let defaults = QueryDefaults::default();
    let invalid = |params: ActiveFiresParams| {
        let err = params.validate(&defaults).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidParameter(_)), "{:?}", err);
    };

    invalid(ActiveFiresParams::default());
    invalid(ActiveFiresParams {
        country: Some("   ".to_string()),
        ..Default::default()
    });
    for days in ["0", "11", "-1", "300", "five", "2.5"] {
        invalid(ActiveFiresParams {
            country: Some("Vietnam".to_string()),
            days: Some(days.to_string()),
            ..Default::default()
        });
    }
    for sources in ["", ",", "LANDSAT", "MODIS_NRT,GOES"] {
        invalid(ActiveFiresParams {
            country: Some("Vietnam".to_string()),
            sources: Some(sources.to_string()),
            ..Default::default()
        });
    }
    invalid(ActiveFiresParams {
        country: Some("Vietnam".to_string()),
        include_low: Some("maybe".to_string()),
        ..Default::default()
    });
    invalid(ActiveFiresParams {
        country: Some("Vietnam".to_string()),
        date: Some("03/01/2024".to_string()),
        ..Default::default()
    });
    invalid(ActiveFiresParams {
        country: Some("Vietnam".to_string()),
        date: Some("2999-01-01".to_string()),
        ..Default::default()
    });
}

#[test]
fn test_parse_helpers() {
    assert_eq!(parse_days(" 10 ").unwrap(), 10);
    assert!(parse_bool("include_low", "TRUE").unwrap());
    assert!(!parse_bool("include_low", "").unwrap());
    assert_eq!(
        parse_sources("viirs_snpp_nrt").unwrap(),
        vec![FirmsSource::ViirsSnppNrt]
    );
}

// ============================================================================
// Upstream Failure Tests
// ============================================================================

#[tokio::test]
async fn test_unknown_country_is_not_found() {
    let nominatim = MockServer::start().await;
    let firms = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY))
        .mount(&nominatim)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&firms)
        .await;

    let gateway = gateway(&firms.uri(), &nominatim.uri());
    let err = gateway
        .active_fires_at(&request("Atlantis", 5), today())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CountryNotFound);
    assert!(err.to_string().contains("Atlantis"));
}

#[tokio::test]
async fn test_firms_unreachable_is_upstream_error() {
    let nominatim = MockServer::start().await;
    mock_vietnam(&nominatim).await;

    // nothing listens on the discard port
    let gateway = gateway("http://127.0.0.1:9", &nominatim.uri());
    let err = gateway
        .active_fires_at(&request("Vietnam", 5), today())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert!(err.to_string().starts_with("FIRMS"));
}

#[tokio::test]
async fn test_one_failing_source_fails_the_request() {
    let nominatim = MockServer::start().await;
    let firms = MockServer::start().await;
    mock_vietnam(&nominatim).await;

    Mock::given(method("GET"))
        .and(path_regex(r"/MODIS_NRT/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&firms)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/VIIRS_"))
        .respond_with(ResponseTemplate::new(200).set_body_string(csv(VIIRS_HEADER, &SNPP_ROWS)))
        .mount(&firms)
        .await;

    let gateway = gateway(&firms.uri(), &nominatim.uri());
    let err = gateway
        .active_fires_at(&request("Vietnam", 5), today())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert!(err.to_string().contains("access limit"));
}

#[tokio::test]
async fn test_firms_plain_text_answer_is_malformed() {
    let nominatim = MockServer::start().await;
    let firms = MockServer::start().await;
    mock_vietnam(&nominatim).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Invalid MAP_KEY."))
        .mount(&firms)
        .await;

    let gateway = gateway(&firms.uri(), &nominatim.uri());
    let err = gateway
        .active_fires_at(&request("Vietnam", 5), today())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedUpstreamResponse);
    assert!(err.to_string().contains("Invalid MAP_KEY."));
}

#[tokio::test]
async fn test_firms_empty_body_is_malformed() {
    let nominatim = MockServer::start().await;
    let firms = MockServer::start().await;
    mock_vietnam(&nominatim).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&firms)
        .await;

    let gateway = gateway(&firms.uri(), &nominatim.uri());
    let err = gateway
        .active_fires_at(&request("Vietnam", 5), today())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedUpstreamResponse);
}

#[tokio::test]
async fn test_firms_header_missing_columns_is_malformed() {
    let nominatim = MockServer::start().await;
    let firms = MockServer::start().await;
    mock_vietnam(&nominatim).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("latitude,longitude,frp\n"))
        .mount(&firms)
        .await;

    let gateway = gateway(&firms.uri(), &nominatim.uri());
    let err = gateway
        .active_fires_at(&request("Vietnam", 5), today())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedUpstreamResponse);
    assert!(err.to_string().contains("acq_date"));
}

#[tokio::test]
async fn test_nominatim_error_status_is_upstream_error() {
    let nominatim = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&nominatim)
        .await;

    let gateway = gateway("http://127.0.0.1:9", &nominatim.uri());
    let err = gateway.lookup_boundary("Vietnam").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert!(err.to_string().starts_with("Nominatim"));
}

#[tokio::test]
async fn test_lookup_boundary_has_rings() {
    let nominatim = MockServer::start().await;
    mock_vietnam(&nominatim).await;

    let gateway = gateway("http://127.0.0.1:9", &nominatim.uri());
    let boundary = gateway.lookup_boundary("Vietnam").await.unwrap();

    assert!(boundary.ring_count() >= 1);
    assert_eq!(boundary.info.center.len(), 2);
}

// ============================================================================
// URL Builder Tests
// ============================================================================

#[test]
fn test_nominatim_search_url() {
    let gateway = gateway("https://firms.example", "https://nominatim.example");
    let url = gateway.nominatim_search_url("VN").unwrap();

    assert!(url.as_str().starts_with("https://nominatim.example/search?q=VN&featureType=country"));
    assert!(gateway.nominatim_search_url("  ").is_err());
}

#[test]
fn test_firms_urls_for_request() {
    let gateway = gateway("https://firms.example", "https://nominatim.example");
    let urls = gateway
        .firms_urls_for(&FirmsUrlsRequest {
            firms_key: KEY.to_string(),
            days: None,
            area: None,
        })
        .unwrap();

    let urls: Vec<String> = urls.into_iter().map(String::from).collect();
    assert_eq!(
        urls,
        vec![
            format!("https://firms.example/api/area/csv/{}/MODIS_NRT/world/9", KEY),
            format!("https://firms.example/api/area/csv/{}/VIIRS_NOAA20_NRT/world/9", KEY),
            format!("https://firms.example/api/area/csv/{}/VIIRS_SNPP_NRT/world/9", KEY),
        ]
    );
}

#[test]
fn test_firms_urls_rejections() {
    let gateway = gateway("https://firms.example", "https://nominatim.example");

    let err = gateway
        .firms_urls_for(&FirmsUrlsRequest {
            firms_key: "not-a-key".to_string(),
            days: None,
            area: None,
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);

    let err = gateway
        .firms_urls_for(&FirmsUrlsRequest {
            firms_key: KEY.to_string(),
            days: Some(11),
            area: None,
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);

    let err = gateway
        .firms_urls_for(&FirmsUrlsRequest {
            firms_key: KEY.to_string(),
            days: None,
            area: Some("north".to_string()),
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}

#[test]
fn test_configured_csv_urls_with_bounds() {
    let gateway = gateway("https://firms.example", "https://nominatim.example");
    let area = FirmsArea::parse("100,10,110,20").unwrap();
    let urls = gateway.configured_csv_urls(&area, Some(2)).unwrap();

    assert_eq!(urls.len(), 3);
    assert!(urls[0].as_str().ends_with("/MODIS_NRT/100.0000,10.0000,110.0000,20.0000/2"));
}
