//! The `fetchOrder` GraphQL request sent for every order.

use serde::Serialize;
use serde_json::Value;

use orderpull_core::OrderId;

pub const OPERATION_NAME: &str = "fetchOrder";

/// Selection set mirrors the order detail view of the Atlas dashboard so the
/// saved documents carry everything needed for transcript comparison.
pub const FETCH_ORDER_QUERY: &str = r#"query fetchOrder($id: Int) {
  order(id: $id) {
    id type merchantRefId deliveryDate created updated timeSlotStart timeSlotEnd
    discount totalTaxes totalCharges subtotal payableAmount walletCreditApplied
    paymentMode channel channelLogo status instructions nextStates nextState
    couponText aggregatorPayload
    externalPlatform {
      id deliveryType
      bizPlatform { platform { name __typename } __typename }
      __typename
    }
    taxes { id title value rate __typename }
    charges { id title value rate __typename }
    address { id name address1 address2 city pin subLocality __typename }
    store { title brand { name __typename } __typename }
    customer { id firstName lastName phone email __typename }
    items {
      id title price quantity totalCharge totalTax total discount discountCode instructions
      taxes { id title value rate __typename }
      charges { id title value rate __typename }
      optionsToAdd { id title price priceAtLocation weight description __typename }
      orderItemOptions { id quantity __typename }
      __typename
    }
    statusUpdates {
      id status prevStatus message
      updatedBy { id username __typename }
      created __typename
    }
    delivery { id __typename }
    paymentTransaction { txnId amount gwTxnId state comments history paymentMethod __typename }
    parentOrder { id __typename }
    childOrderId
    __typename
  }
}"#;

/// JSON body of a GraphQL POST.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest<'a> {
    pub operation_name: &'a str,
    pub variables: Variables,
    pub query: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Variables {
    pub id: Value,
}

/// Build the request for one order. Numeric IDs are sent as JSON integers,
/// as the schema declares `$id: Int`.
pub fn fetch_order_request(id: &OrderId) -> GraphqlRequest<'static> {
    let id = match id.as_i64() {
        Some(n) => Value::from(n),
        None => Value::from(id.as_str()),
    };
    GraphqlRequest {
        operation_name: OPERATION_NAME,
        variables: Variables { id },
        query: FETCH_ORDER_QUERY,
    }
}
