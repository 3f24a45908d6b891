#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;

use textbook_export::browser::{TocDiscoverer, TocSnapshot};
use textbook_export::error::BrowserError;
use textbook_export::services::SubsectionFetcher;
use textbook_export::transform::ContentTransformer;
use textbook_export::workflow::SubsectionFlow;
use textbook_export::{AllowList, BookExporter, ConcurrencyGovernor, Config};

pub const SLOW_PAGE_DELAY: Duration = Duration::from_secs(3);
pub const COUNTED_PAGE_DELAY: Duration = Duration::from_millis(150);

/// Table of contents with two parts: two subsections, then one
pub fn two_part_toc(pages: [&str; 3]) -> String {
    format!(
        r#"<nav data-testid="toc">
             <span class="os-number">1</span>
             <span class="os-text">Units and Measurement</span>
             <ol>
               <li><a href="{}">1.1 The Scope and Scale of Physics</a></li>
               <li><a href="{}">1.2 Units and Standards</a></li>
             </ol>
             <span class="os-number">2</span>
             <span class="os-text">Vectors</span>
             <ol><li><a href="{}">2.1 Scalars and Vectors</a></li></ol>
           </nav>"#,
        pages[0], pages[1], pages[2]
    )
}

/// Table of contents with a single part linking every page in order
pub fn single_part_toc(pages: &[String]) -> String {
    let links: String = pages
        .iter()
        .map(|page| format!(r#"<li><a href="{}">{}</a></li>"#, page, page))
        .collect();
    format!(
        r#"<nav data-testid="toc">
             <span class="os-number">1</span>
             <span class="os-text">Everything</span>
             <ol>{}</ol>
           </nav>"#,
        links
    )
}

fn subsection_page(heading: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><title>{heading}</title></head>
<body>
  <nav>site chrome</nav>
  <div id="main-content" data-page="x">
    <h2 class="os-title">{heading}</h2>
    <section class="learning-objectives"><h3>Objectives</h3><ul><li>Learn</li></ul></section>
    <p tabindex="-1">Velocity is <math><mfrac><mi>d</mi><mi>t</mi></mfrac></math>.</p>
    <figure><img data-lazy-src="../resources/fig1.jpg"><figcaption>Figure 1</figcaption></figure>
  </div>
</body></html>"#
    )
}

async fn page(Path(page): Path<String>) -> Response {
    match page.as_str() {
        "missing" => (StatusCode::NOT_FOUND, "not found").into_response(),
        "slow" => {
            tokio::time::sleep(SLOW_PAGE_DELAY).await;
            Html(subsection_page("Slow")).into_response()
        }
        other => Html(subsection_page(other)).into_response(),
    }
}

/// Serves subsection pages at `/books/physics/pages/{page}`
pub async fn spawn_fixture_site() -> SocketAddr {
    let app = Router::new().route("/books/physics/pages/{page}", get(page));
    spawn_router(app).await
}

/// Page requests currently being served, and the most ever seen at once
#[derive(Clone, Default)]
pub struct InFlight {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl InFlight {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }
}

async fn counted_page(State(in_flight): State<InFlight>, Path(page): Path<String>) -> Response {
    let now = in_flight.current.fetch_add(1, Ordering::SeqCst) + 1;
    in_flight.peak.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(COUNTED_PAGE_DELAY).await;
    in_flight.current.fetch_sub(1, Ordering::SeqCst);
    Html(subsection_page(&page)).into_response()
}

/// Like [`spawn_fixture_site`], but every page is slow and counted
pub async fn spawn_counting_site() -> (SocketAddr, InFlight) {
    let in_flight = InFlight::default();
    let app = Router::new()
        .route("/books/physics/pages/{page}", get(counted_page))
        .with_state(in_flight.clone());
    (spawn_router(app).await, in_flight)
}

pub async fn spawn_router(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub fn toc_url(addr: SocketAddr) -> String {
    format!("http://{}/books/physics/pages/1-introduction", addr)
}

/// Returns fixed markup; optionally holds every call until released
pub struct FixtureDiscoverer {
    markup: String,
    hold: Option<watch::Receiver<bool>>,
    fail: bool,
}

impl FixtureDiscoverer {
    pub fn new(markup: String) -> Self {
        Self {
            markup,
            hold: None,
            fail: false,
        }
    }

    pub fn held(markup: String, release: watch::Receiver<bool>) -> Self {
        Self {
            markup,
            hold: Some(release),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            markup: String::new(),
            hold: None,
            fail: true,
        }
    }
}

#[async_trait]
impl TocDiscoverer for FixtureDiscoverer {
    async fn discover(&self, _url: &str) -> Result<TocSnapshot, BrowserError> {
        if self.fail {
            return Err(BrowserError::timeout(
                "table of contents control",
                Duration::from_secs(60),
            ));
        }
        if let Some(hold) = &self.hold {
            let mut hold = hold.clone();
            hold.wait_for(|released| *released).await.unwrap();
        }
        Ok(TocSnapshot {
            title: Some("University Physics Volume 1".to_string()),
            markup: self.markup.clone(),
        })
    }
}

pub fn allow_list() -> AllowList {
    AllowList::from_css(include_str!("../../assets/style.css"))
}

pub fn exporter(
    discoverer: Arc<dyn TocDiscoverer>,
    fetch_timeout: Duration,
    governor: Arc<ConcurrencyGovernor>,
) -> BookExporter {
    let config = Config::default();
    let flow = SubsectionFlow::new(
        SubsectionFetcher::new(fetch_timeout).unwrap(),
        ContentTransformer::new(&config, Arc::new(allow_list())).unwrap(),
    );
    BookExporter::new(&config, discoverer, Arc::new(flow), governor).unwrap()
}

/// One `<item>` of an export, split out for field lookups
pub struct Item<'a>(pub &'a str);

impl<'a> Item<'a> {
    pub fn field(&self, tag: &str) -> Option<&'a str> {
        let open = format!("<{}>", tag);
        let close = format!("</{}>", tag);
        let start = self.0.find(&open)? + open.len();
        let end = self.0[start..].find(&close)? + start;
        Some(&self.0[start..end])
    }

    pub fn content(&self) -> &'a str {
        let raw = self.field("content:encoded").unwrap_or_default();
        raw.strip_prefix("<![CDATA[")
            .and_then(|s| s.strip_suffix("]]>"))
            .unwrap_or(raw)
    }
}

pub fn items(xml: &str) -> Vec<Item<'_>> {
    xml.split("<item>").skip(1).map(Item).collect()
}
