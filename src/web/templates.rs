use crate::tracks::FileGroup;
use askama::Template;

#[derive(Template)]
#[template(path = "browser.html")]
pub struct BrowserTemplate {
    pub reference_name: String,
    pub bam_groups: Vec<FileGroup>,
    pub signal_groups: Vec<FileGroup>,
}
