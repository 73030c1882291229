//! Outcome annotations attached to a failure record

/// Receives the human-readable note written for each triaged failure
pub trait AnnotationSink {
    /// Record one annotation
    fn annotate(&mut self, note: String);
}

impl AnnotationSink for Vec<String> {
    fn annotate(&mut self, note: String) {
        self.push(note);
    }
}

impl<S: AnnotationSink + ?Sized> AnnotationSink for &mut S {
    fn annotate(&mut self, note: String) {
        (**self).annotate(note);
    }
}
