use crate::error::CsvError;

/// Result of reading one item: `Ok(None)` once the source is exhausted.
pub type ItemReaderResult<R> = Result<Option<R>, CsvError>;

/// Result of writing a batch of items.
pub type ItemWriterResult = Result<(), CsvError>;

/// Produces items one at a time from a source.
pub trait ItemReader<R> {
    /// Reads the next item.
    ///
    /// End of input is not an error: it is reported as `Ok(None)`, and every
    /// later call keeps returning `Ok(None)`.
    fn read(&self) -> ItemReaderResult<R>;
}

/// Consumes items, one call per batch.
pub trait ItemWriter<W> {
    fn write(&self, items: &[W]) -> ItemWriterResult;

    /// Pushes buffered output to the underlying sink.
    fn flush(&self) -> ItemWriterResult;
}
