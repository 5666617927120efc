//! Announcement service capabilities.

use std::sync::Arc;

use crate::rpc::ServiceClient;

capability! {
    pub trait Announcement, client AnnouncementClient, prefix "Announcement" {
        fn create_announcement => "CreateAnnouncement";
        fn get_announcements => "GetAnnouncements";
        fn get_announcement_detail => "GetAnnouncementDetail";
        fn update_announcement => "UpdateAnnouncement";
        fn delete_announcement => "DeleteAnnouncement";
        fn check_announcement => "CheckAnnouncement";
        fn search_announcements => "SearchAnnouncements";
        fn get_my_announcements => "GetMyAnnouncements";
    }
}

#[derive(Clone)]
pub struct AnnouncementService {
    announcement: Arc<dyn Announcement>,
}

impl AnnouncementService {
    pub fn connect(client: Arc<ServiceClient>) -> Self {
        Self {
            announcement: Arc::new(AnnouncementClient::new(client)),
        }
    }

    pub fn from_parts(announcement: Arc<dyn Announcement>) -> Self {
        Self { announcement }
    }

    pub fn announcement(&self) -> &dyn Announcement {
        self.announcement.as_ref()
    }
}
