use serde::{Deserialize, Serialize};

/* Organization extraction answer */
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrgExtraction {
    #[serde(default)]
    pub organizations: Vec<String>,
}
