//! The top-level [`Logging`] client.

use crate::auth::{Credentials, TokenProvider};
use crate::config::ClientConfig;
use crate::error::{LoggingError, Result};
use crate::log::Log;
use crate::models::{Entry, EntryMetadata, MonitoredResource, Payload, SinkMetadata};
use crate::names;
use crate::proto::{api, v2};
use crate::resource::{EnvironmentDetector, ResourceDetector};
use crate::sink::Sink;
use crate::transport::{GrpcTransport, LoggingTransport};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use validator::Validate;

/// Order applied to entry reads when the caller gives none.
pub const DEFAULT_ORDER_BY: &str = "timestamp desc";

/// Options for reading entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetEntriesOptions {
    /// Parents to read from. Defaults to the client's project.
    pub resource_names: Vec<String>,
    /// Advanced logs filter.
    pub filter: Option<String>,
    /// `timestamp asc` or `timestamp desc`. Defaults to [`DEFAULT_ORDER_BY`].
    pub order_by: Option<String>,
    /// Entries per page requested from the service.
    pub page_size: Option<i32>,
    /// Token of the page to start from.
    pub page_token: Option<String>,
    /// Stop after this many entries.
    pub max_results: Option<usize>,
    /// Follow next-page tokens. When false, one page is fetched.
    pub auto_paginate: bool,
}

impl Default for GetEntriesOptions {
    fn default() -> Self {
        Self {
            resource_names: Vec::new(),
            filter: None,
            order_by: None,
            page_size: None,
            page_token: None,
            max_results: None,
            auto_paginate: true,
        }
    }
}

impl GetEntriesOptions {
    /// Sets the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sets the order.
    #[must_use]
    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Sets the starting page token.
    #[must_use]
    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    /// Caps the number of entries returned.
    #[must_use]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Enables or disables following next-page tokens.
    #[must_use]
    pub fn with_auto_paginate(mut self, auto_paginate: bool) -> Self {
        self.auto_paginate = auto_paginate;
        self
    }
}

/// Options for listing sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSinksOptions {
    /// Sinks per page requested from the service.
    pub page_size: Option<i32>,
    /// Token of the page to start from.
    pub page_token: Option<String>,
    /// Stop after this many sinks.
    pub max_results: Option<usize>,
    /// Follow next-page tokens. When false, one page is fetched.
    pub auto_paginate: bool,
}

impl Default for GetSinksOptions {
    fn default() -> Self {
        Self {
            page_size: None,
            page_token: None,
            max_results: None,
            auto_paginate: true,
        }
    }
}

/// One batch of results.
///
/// `next_page_token` is set only for single-page reads that have more.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items in this batch.
    pub items: Vec<T>,
    /// Token for the following page.
    pub next_page_token: Option<String>,
}

struct Inner {
    project_id: String,
    transport: Arc<dyn LoggingTransport>,
    detector: Option<Arc<dyn ResourceDetector>>,
    default_resource: OnceCell<Option<api::MonitoredResource>>,
}

/// Cloud Logging client.
///
/// Cheap to clone; clones share the transport and the detected default
/// resource.
///
/// # Example
///
/// ```
/// use cloud_logging::{Logging, transport::InMemoryTransport};
///
/// # tokio_test::block_on(async {
/// let logging = Logging::with_transport("my-project", InMemoryTransport::new_shared()).unwrap();
/// let log = logging.log("syslog").unwrap();
/// log.info("Server started", Default::default()).await.unwrap();
///
/// let page = logging.get_entries(Default::default()).await.unwrap();
/// assert_eq!(page.items.len(), 1);
/// # });
/// ```
#[derive(Clone)]
pub struct Logging {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Logging {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logging")
            .field("project_id", &self.inner.project_id)
            .finish_non_exhaustive()
    }
}

impl Logging {
    /// Connects to the service with application-default credentials.
    ///
    /// The project id is taken from `config`, then from the credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials cannot be loaded, no project id is
    /// known, or the endpoint cannot be reached.
    pub async fn new(config: ClientConfig) -> Result<Self> {
        let credentials = Credentials::from_environment().await?;
        let project_id = config
            .project_id
            .clone()
            .or_else(|| credentials.project_id())
            .ok_or_else(|| {
                LoggingError::Config(
                    "No project id configured and none found in credentials".to_string(),
                )
            })?;

        let tokens: Arc<dyn TokenProvider> = Arc::new(credentials);
        let transport =
            GrpcTransport::connect(&config.endpoint, config.timeout, Some(tokens)).await?;

        tracing::info!(project_id = %project_id, endpoint = %config.endpoint, "Logging client ready");

        let detector: Option<Arc<dyn ResourceDetector>> = if config.detect_resource {
            Some(Arc::new(EnvironmentDetector::new()?))
        } else {
            None
        };
        Ok(Self::build(project_id, Arc::new(transport), detector))
    }

    /// Creates a client over an existing transport.
    ///
    /// No default resource is detected unless
    /// [`with_resource_detector`](Self::with_resource_detector) is called.
    ///
    /// # Errors
    ///
    /// Returns an error if `project_id` is empty.
    pub fn with_transport(
        project_id: impl Into<String>,
        transport: Arc<dyn LoggingTransport>,
    ) -> Result<Self> {
        let project_id = project_id.into();
        names::project_name(&project_id)?;
        Ok(Self::build(project_id, transport, None))
    }

    /// Returns a client that resolves the default resource with `detector`.
    #[must_use]
    pub fn with_resource_detector(self, detector: Arc<dyn ResourceDetector>) -> Self {
        Self::build(
            self.inner.project_id.clone(),
            Arc::clone(&self.inner.transport),
            Some(detector),
        )
    }

    fn build(
        project_id: String,
        transport: Arc<dyn LoggingTransport>,
        detector: Option<Arc<dyn ResourceDetector>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                project_id,
                transport,
                detector,
                default_resource: OnceCell::new(),
            }),
        }
    }

    /// The project this client operates on.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.inner.project_id
    }

    pub(crate) fn transport(&self) -> &dyn LoggingTransport {
        self.inner.transport.as_ref()
    }

    /// Resolves the default resource once; failures resolve to `None`.
    pub(crate) async fn default_resource(&self) -> Option<api::MonitoredResource> {
        let detector = self.inner.detector.as_ref()?;
        self.inner
            .default_resource
            .get_or_init(|| async {
                match detector.detect().await {
                    Ok(resource) => Some(resource.to_proto()),
                    Err(e) => {
                        tracing::warn!(error = %e, "Default resource detection failed");
                        None
                    }
                }
            })
            .await
            .clone()
    }

    /// Returns a handle to the named log.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty.
    pub fn log(&self, name: &str) -> Result<Log> {
        Log::new(self.clone(), name)
    }

    /// Returns a handle to the named sink. Nothing is fetched.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty.
    pub fn sink(&self, name: &str) -> Result<Sink> {
        Sink::new(self.clone(), name, None)
    }

    /// Creates an entry attributed to `resource`, not bound to any log.
    #[must_use]
    pub fn entry(&self, resource: Option<MonitoredResource>, data: impl Into<Payload>) -> Entry {
        let metadata = EntryMetadata {
            resource,
            ..EntryMetadata::default()
        };
        Entry::with_metadata(metadata, data)
    }

    /// Creates a sink.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is empty, `metadata` is invalid, or the
    /// service rejects the sink.
    pub async fn create_sink(&self, name: &str, metadata: SinkMetadata) -> Result<Sink> {
        if name.is_empty() {
            return Err(LoggingError::InvalidArgument(
                "A sink name must be provided.".to_string(),
            ));
        }
        metadata.validate()?;

        let parent = names::project_name(self.project_id())?;
        let sink_id = names::short_name(name);
        let request = v2::CreateSinkRequest {
            parent,
            sink: Some(metadata.to_proto(&sink_id)),
            unique_writer_identity: false,
        };

        tracing::debug!(sink = %sink_id, destination = %metadata.destination, "Creating sink");
        let created = self.transport().create_sink(request).await?;
        Sink::new(self.clone(), &sink_id, Some(SinkMetadata::from(created)))
    }

    fn entries_request(&self, options: &GetEntriesOptions) -> Result<v2::ListLogEntriesRequest> {
        let resource_names = if options.resource_names.is_empty() {
            vec![names::project_name(self.project_id())?]
        } else {
            options.resource_names.clone()
        };
        let page_size = options
            .page_size
            .or_else(|| options.max_results.and_then(|m| i32::try_from(m).ok()))
            .unwrap_or_default();

        Ok(v2::ListLogEntriesRequest {
            resource_names,
            filter: options.filter.clone().unwrap_or_default(),
            order_by: options
                .order_by
                .clone()
                .unwrap_or_else(|| DEFAULT_ORDER_BY.to_string()),
            page_size,
            page_token: options.page_token.clone().unwrap_or_default(),
        })
    }

    async fn fetch_entries(
        &self,
        mut request: v2::ListLogEntriesRequest,
        token: Option<String>,
    ) -> Result<(Vec<Entry>, Option<String>)> {
        if let Some(token) = token {
            request.page_token = token;
        }
        tracing::debug!(filter = %request.filter, page_token = %request.page_token, "Listing entries");
        let response = self.transport().list_log_entries(request).await?;
        let entries = response.entries.into_iter().map(Entry::from_proto).collect();
        Ok((entries, non_empty(response.next_page_token)))
    }

    /// Reads entries.
    ///
    /// # Errors
    ///
    /// Returns the first RPC failure.
    pub async fn get_entries(&self, options: GetEntriesOptions) -> Result<Page<Entry>> {
        if !options.auto_paginate {
            let request = self.entries_request(&options)?;
            let (mut items, next_page_token) = self.fetch_entries(request, None).await?;
            if let Some(max) = options.max_results {
                items.truncate(max);
            }
            return Ok(Page {
                items,
                next_page_token,
            });
        }
        let items = self.get_entries_stream(options).try_collect().await?;
        Ok(Page {
            items,
            next_page_token: None,
        })
    }

    /// Streams entries, fetching pages as the stream is polled.
    #[must_use]
    pub fn get_entries_stream(&self, options: GetEntriesOptions) -> BoxStream<'static, Result<Entry>> {
        let request = match self.entries_request(&options) {
            Ok(request) => request,
            Err(e) => return stream::once(async { Err(e) }).boxed(),
        };
        let client = self.clone();
        paged(options.max_results, move |token| {
            let client = client.clone();
            let request = request.clone();
            async move { client.fetch_entries(request, token).await }
        })
    }

    async fn fetch_sinks(
        &self,
        page_size: i32,
        token: Option<String>,
    ) -> Result<(Vec<Sink>, Option<String>)> {
        let request = v2::ListSinksRequest {
            parent: names::project_name(self.project_id())?,
            page_token: token.unwrap_or_default(),
            page_size,
        };
        let response = self.transport().list_sinks(request).await?;
        let sinks = response
            .sinks
            .into_iter()
            .map(|sink| {
                let name = sink.name.clone();
                Sink::new(self.clone(), &name, Some(SinkMetadata::from(sink)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((sinks, non_empty(response.next_page_token)))
    }

    /// Lists sinks.
    ///
    /// # Errors
    ///
    /// Returns the first RPC failure.
    pub async fn get_sinks(&self, options: GetSinksOptions) -> Result<Page<Sink>> {
        if !options.auto_paginate {
            let (mut items, next_page_token) = self
                .fetch_sinks(sinks_page_size(&options), options.page_token)
                .await?;
            if let Some(max) = options.max_results {
                items.truncate(max);
            }
            return Ok(Page {
                items,
                next_page_token,
            });
        }
        let items = self.get_sinks_stream(options).try_collect().await?;
        Ok(Page {
            items,
            next_page_token: None,
        })
    }

    /// Streams sinks, fetching pages as the stream is polled.
    #[must_use]
    pub fn get_sinks_stream(&self, options: GetSinksOptions) -> BoxStream<'static, Result<Sink>> {
        let client = self.clone();
        let page_size = sinks_page_size(&options);
        let first = options.page_token;
        let mut started = false;
        paged(options.max_results, move |token| {
            let client = client.clone();
            let token = if started { token } else { first.clone() };
            started = true;
            async move { client.fetch_sinks(page_size, token).await }
        })
    }

    /// Lists the names of logs that have entries.
    ///
    /// # Errors
    ///
    /// Returns the first RPC failure.
    pub async fn list_logs(&self) -> Result<Vec<String>> {
        let parent = names::project_name(self.project_id())?;
        let client = self.clone();
        paged(None, move |token| {
            let client = client.clone();
            let parent = parent.clone();
            async move {
                let response = client
                    .transport()
                    .list_logs(v2::ListLogsRequest {
                        parent,
                        page_size: 0,
                        page_token: token.unwrap_or_default(),
                    })
                    .await?;
                Ok((response.log_names, non_empty(response.next_page_token)))
            }
        })
        .try_collect()
        .await
    }
}

/// Page size to request: explicit, else the result cap, else the service default.
fn sinks_page_size(options: &GetSinksOptions) -> i32 {
    options
        .page_size
        .or_else(|| options.max_results.and_then(|m| i32::try_from(m).ok()))
        .unwrap_or_default()
}

fn non_empty(token: String) -> Option<String> {
    Some(token).filter(|t| !t.is_empty())
}

struct Pager<T, F> {
    fetch: F,
    token: Option<String>,
    buffer: VecDeque<T>,
    remaining: Option<usize>,
    exhausted: bool,
}

/// Flattens a paged listing into a stream of items.
///
/// `fetch` receives the next-page token (`None` for the first call) and
/// returns one page plus the following token.
fn paged<T, F, Fut>(max_results: Option<usize>, fetch: F) -> BoxStream<'static, Result<T>>
where
    T: Send + 'static,
    F: FnMut(Option<String>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(Vec<T>, Option<String>)>> + Send,
{
    let pager = Pager {
        fetch,
        token: None,
        buffer: VecDeque::new(),
        remaining: max_results,
        exhausted: false,
    };

    stream::try_unfold(pager, |mut pager| async move {
        loop {
            if pager.remaining == Some(0) {
                return Ok::<_, LoggingError>(None);
            }
            if let Some(item) = pager.buffer.pop_front() {
                if let Some(remaining) = pager.remaining.as_mut() {
                    *remaining -= 1;
                }
                return Ok(Some((item, pager)));
            }
            if pager.exhausted {
                return Ok(None);
            }
            let (items, next) = (pager.fetch)(pager.token.take()).await?;
            pager.exhausted = next.is_none();
            pager.token = next;
            pager.buffer.extend(items);
        }
    })
    .boxed()
}
