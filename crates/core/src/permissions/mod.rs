//! Permission system for back-office operations

use crate::models::StaffRole;

/// Actions a staff member can perform in the back office
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeskAction {
    // Booking lifecycle
    ApproveOverbooking,
    RejectBooking,
    CancelAnyBooking,
    RescheduleBooking,
    MoveBookingToWaitlist,
    BookFromWaitlist,

    // Catalog management
    EditShows,
    DeleteShows,
    ManagePackages,
    ManageMerchandise,
    ManagePromoCodes,

    // Billing
    IssueInvoices,
    RecordPayments,
    CreditInvoices,

    // Administration
    ManageStaff,
    ManageShifts,
    EditSettings,

    // Reporting
    ViewReports,
    ExportReports,
}

/// Permission matrix for staff roles
pub struct PermissionMatrix;

impl PermissionMatrix {
    /// Check if a role has permission to perform an action
    pub fn can_perform(role: StaffRole, action: DeskAction) -> bool {
        match action {
            // Overbooking approval is a management call
            DeskAction::ApproveOverbooking => role >= StaffRole::Manager,
            DeskAction::RejectBooking => role >= StaffRole::BoxOffice,
            DeskAction::CancelAnyBooking => role >= StaffRole::BoxOffice,
            DeskAction::RescheduleBooking => role >= StaffRole::BoxOffice,
            DeskAction::MoveBookingToWaitlist => role >= StaffRole::BoxOffice,
            DeskAction::BookFromWaitlist => role >= StaffRole::BoxOffice,

            // Catalog - managers shape the program, owners delete
            DeskAction::EditShows => role >= StaffRole::Manager,
            DeskAction::DeleteShows => role == StaffRole::Owner,
            DeskAction::ManagePackages => role >= StaffRole::Manager,
            DeskAction::ManageMerchandise => role >= StaffRole::Manager,
            DeskAction::ManagePromoCodes => role >= StaffRole::Manager,

            // Billing
            DeskAction::IssueInvoices => role >= StaffRole::Manager,
            DeskAction::RecordPayments => role >= StaffRole::BoxOffice,
            DeskAction::CreditInvoices => role >= StaffRole::Manager,

            // Administration - owner only, except the rota
            DeskAction::ManageStaff => role == StaffRole::Owner,
            DeskAction::ManageShifts => role >= StaffRole::Manager,
            DeskAction::EditSettings => role == StaffRole::Owner,

            // Reporting
            DeskAction::ViewReports => role >= StaffRole::BoxOffice,
            DeskAction::ExportReports => role >= StaffRole::Manager,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usher_is_read_only() {
        assert!(!PermissionMatrix::can_perform(StaffRole::Usher, DeskAction::RejectBooking));
        assert!(!PermissionMatrix::can_perform(StaffRole::Usher, DeskAction::ViewReports));
        assert!(!PermissionMatrix::can_perform(StaffRole::Usher, DeskAction::BookFromWaitlist));
    }

    #[test]
    fn test_box_office_handles_bookings_but_not_approvals() {
        assert!(PermissionMatrix::can_perform(StaffRole::BoxOffice, DeskAction::CancelAnyBooking));
        assert!(PermissionMatrix::can_perform(StaffRole::BoxOffice, DeskAction::BookFromWaitlist));
        assert!(!PermissionMatrix::can_perform(StaffRole::BoxOffice, DeskAction::ApproveOverbooking));
        assert!(!PermissionMatrix::can_perform(StaffRole::BoxOffice, DeskAction::EditShows));
    }

    #[test]
    fn test_manager_approves_overbookings() {
        assert!(PermissionMatrix::can_perform(StaffRole::Manager, DeskAction::ApproveOverbooking));
        assert!(PermissionMatrix::can_perform(StaffRole::Manager, DeskAction::IssueInvoices));
        assert!(!PermissionMatrix::can_perform(StaffRole::Manager, DeskAction::ManageStaff));
        assert!(!PermissionMatrix::can_perform(StaffRole::Manager, DeskAction::DeleteShows));
    }

    #[test]
    fn test_owner_can_do_everything() {
        for action in [
            DeskAction::ApproveOverbooking,
            DeskAction::DeleteShows,
            DeskAction::ManageStaff,
            DeskAction::EditSettings,
            DeskAction::ExportReports,
        ] {
            assert!(PermissionMatrix::can_perform(StaffRole::Owner, action));
        }
    }
}
