//! Loading of the corpus frequency tables over HTTP

use crate::{
    config::Config,
    dataset::{Dataset, FrequencyTable, Mode, TableBuilder},
    progress::{ProgressReport, ProgressTracker},
    Result,
};
use anyhow::Context;
use csv_async::AsyncReaderBuilder;
use futures::StreamExt;
use reqwest::Response;
use std::{
    io::{self, ErrorKind},
    sync::Arc,
};
use tokio::{io::AsyncRead, task::JoinSet};
use tokio_util::io::StreamReader;

/// Download both frequency tables and collect them into a dataset
pub async fn download_and_collect(
    config: Arc<Config>,
    client: reqwest::Client,
    report: &ProgressReport,
) -> Result<Arc<Dataset>> {
    // Track file downloads
    let downloads = report.add_steps("Initiating data downloads", Mode::ALL.len());
    let bytes = report.add_bytes("Downloading and decoding data");

    // Start one download per normalization mode
    let mut tables = JoinSet::new();
    for mode in Mode::ALL {
        tables.spawn(download_and_parse(
            config.clone(),
            client.clone(),
            mode,
            downloads.clone(),
            bytes.clone(),
        ));
    }

    // Collect the tables as downloads finish
    let mut absolute = None;
    let mut relative = None;
    while let Some(table) = tables.join_next().await {
        let (mode, table) = table.context("collecting results from one data file")??;
        match mode {
            Mode::Absolute => absolute = Some(table),
            Mode::Relative => relative = Some(table),
        }
    }
    downloads.finish();
    bytes.finish();
    let absolute = absolute.context("absolute frequency table went missing")?;
    let relative = relative.context("relative frequency table went missing")?;
    Ok(Arc::new(Dataset::new(absolute, relative)))
}

/// Download one frequency table and decode the data inside
async fn download_and_parse(
    config: Arc<Config>,
    client: reqwest::Client,
    mode: Mode,
    downloads: ProgressTracker,
    bytes: ProgressTracker,
) -> Result<(Mode, FrequencyTable)> {
    // Start the download
    let url = config.dataset_url(mode);
    let context = || format!("initiating download of {url}");
    let response = client
        .get(&*url)
        .send()
        .await
        .and_then(Response::error_for_status)
        .with_context(context)?;
    if let Some(len) = response.content_length() {
        bytes.add_work(len);
    }
    downloads.make_progress(1);

    // Slice the download into chunks of bytes
    let csv_bytes = StreamReader::new(response.bytes_stream().map(move |res| {
        res
            // Track how many input bytes have been downloaded so far
            .inspect(|bytes_block| {
                bytes.make_progress(bytes_block.len() as u64);
            })
            // Translate reqwest errors into I/O errors
            .map_err(|e| io::Error::new(ErrorKind::Other, Box::new(e)))
    }));

    // Decode the CSV rows into a frequency table
    let context = || format!("fetching and decoding {url}");
    let table = read_table(csv_bytes).await.with_context(context)?;
    Ok((mode, table))
}

/// Decode one CSV frequency table from a byte stream
async fn read_table(csv_bytes: impl AsyncRead + Send + Unpin) -> Result<FrequencyTable> {
    let mut reader = AsyncReaderBuilder::new().create_reader(csv_bytes);
    let headers = reader
        .headers()
        .await
        .context("decoding the CSV header row")?;
    let mut table = TableBuilder::new(headers.iter())?;
    let mut records = reader.records();
    while let Some(record) = records.next().await {
        let record = record.context("decoding one CSV row")?;
        table.push_row(record.iter())?;
    }
    table.finish()
}
