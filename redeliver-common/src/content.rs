use std::sync::Arc;

use mailparse::{MailAddr, MailHeaderMap};

use crate::MessageId;

const RECIPIENT_HEADERS: [&str; 3] = ["To", "Cc", "Bcc"];

/// Raw bytes of an outgoing message together with its identifier
///
/// Content is immutable once written: cloning shares the underlying buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailContent {
    message_id: MessageId,
    data: Arc<[u8]>,
}

impl MailContent {
    #[must_use]
    pub fn new(message_id: MessageId, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            message_id,
            data: data.into(),
        }
    }

    #[must_use]
    pub const fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Addresses found in the `To`, `Cc` and `Bcc` headers, in header order
    ///
    /// Content that does not parse as RFC 5322 headers yields no recipients;
    /// unparseable address headers are skipped.
    #[must_use]
    pub fn recipients(&self) -> Vec<String> {
        let Ok((headers, _)) = mailparse::parse_headers(&self.data) else {
            return Vec::new();
        };

        RECIPIENT_HEADERS
            .iter()
            .flat_map(|name| headers.get_all_headers(name))
            .filter_map(|header| mailparse::addrparse_header(header).ok())
            .flat_map(|list| {
                list.iter()
                    .flat_map(|addr| match addr {
                        MailAddr::Group(group) => {
                            group.addrs.iter().map(|s| s.addr.clone()).collect::<Vec<_>>()
                        }
                        MailAddr::Single(single) => vec![single.addr.clone()],
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
