use url::Url;

/// A streamed request to one of the assistant endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnRequest {
    /// Patient chat with the assistant.
    Chat {
        user_input: String,
        user_id: String,
        conversation_id: Option<String>,
    },
    /// Medical summary generation for a visit.
    Summary {
        visit_id: String,
        doctor_id: String,
        patient_id: String,
    },
}

impl TurnRequest {
    /// Build the endpoint URL under `base_url`, keeping any path prefix the
    /// base already has.
    pub fn url(&self, base_url: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(base_url)?;
        match self {
            TurnRequest::Chat {
                user_input,
                user_id,
                conversation_id,
            } => {
                append_segments(&mut url, &["api", "dify", "chat"])?;
                let mut query = url.query_pairs_mut();
                query.append_pair("userInput", user_input.trim());
                query.append_pair("userId", user_id);
                if let Some(id) = conversation_id.as_deref().filter(|id| !id.is_empty()) {
                    query.append_pair("conversationId", id);
                }
            }
            TurnRequest::Summary {
                visit_id,
                doctor_id,
                patient_id,
            } => {
                append_segments(
                    &mut url,
                    &["api", "medical-summary", "generate", visit_id.as_str()],
                )?;
                url.query_pairs_mut()
                    .append_pair("doctorId", doctor_id)
                    .append_pair("patientId", patient_id);
            }
        }
        Ok(url)
    }
}

fn append_segments(url: &mut Url, segments: &[&str]) -> Result<(), url::ParseError> {
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments);
    Ok(())
}
